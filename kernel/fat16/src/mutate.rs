//! Cluster allocation and directory creation.
//!
//! Write order keeps a crash from leaving a reachable entry that points at
//! garbage: a cluster is claimed in the FAT, then zeroed and initialized, and
//! only then linked into a chain or named by a directory entry. The worst
//! case is a leaked cluster.

use crate::block_dev::{BlockDev, le16, read_sector, write_sector};
use crate::consts::{DIR_ENTRY_SIZE, FAT16_EOC_MARK, FAT_ENTRIES_PER_SECTOR, FIRST_DATA_CLUSTER, SECTOR_SIZE};
use crate::dir::{DirCursor, DirRef, SlotPos};
use crate::entry::{DOT_NAME, DOTDOT_NAME, DirEntry};
use crate::error::FsError;
use crate::name::encode_8_3;
use crate::resolve::{resolve, split_leaf};
use crate::volume::Volume;

/// Outcome of a free-slot search in a cluster-chained directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSearch {
    Found(SlotPos),
    /// Every slot is taken; the chain ends at `last_cluster`.
    NeedsExtension { last_cluster: u16 },
}

impl Volume {
    /// Claim the lowest free cluster and mark it end-of-chain in every FAT copy.
    pub fn allocate_cluster<D: BlockDev>(&self, disk: &mut D) -> Result<u16, FsError> {
        let mut sec = [0u8; SECTOR_SIZE];
        let mut loaded = None;

        for cluster in FIRST_DATA_CLUSTER..=self.max_cluster {
            let sector = cluster as u64 / FAT_ENTRIES_PER_SECTOR as u64;
            if loaded != Some(sector) {
                read_sector(disk, self.fat_lba + sector, &mut sec)?;
                loaded = Some(sector);
            }
            let idx = (cluster as usize % FAT_ENTRIES_PER_SECTOR) * 2;
            if le16(&sec, idx) != 0 {
                continue;
            }
            // Primary says free; the mirror may still disagree.
            if self.next_cluster(disk, cluster)? != 0 {
                continue;
            }
            self.set_fat_entry(disk, cluster, FAT16_EOC_MARK)?;
            return Ok(cluster);
        }
        Err(FsError::NoSpace)
    }

    pub fn zero_cluster<D: BlockDev>(&self, disk: &mut D, cluster: u16) -> Result<(), FsError> {
        self.check_data_cluster(cluster)?;
        let zero = [0u8; SECTOR_SIZE];
        let lba = self.cluster_to_lba(cluster);
        for s in 0..self.sectors_per_cluster() as u64 {
            write_sector(disk, lba + s, &zero)?;
        }
        Ok(())
    }

    /// Allocate and zero a cluster, then link it after `last_cluster`.
    pub fn extend_chain<D: BlockDev>(&self, disk: &mut D, last_cluster: u16) -> Result<u16, FsError> {
        self.check_data_cluster(last_cluster)?;
        let new = self.allocate_cluster(disk)?;
        self.zero_cluster(disk, new)?;
        self.set_fat_entry(disk, last_cluster, new)?;
        Ok(new)
    }

    /// Zero `cluster` and give it `.` (itself) and `..` (`parent`, 0 for root).
    pub fn init_directory_cluster<D: BlockDev>(&self, disk: &mut D, cluster: u16, parent: DirRef) -> Result<(), FsError> {
        if let DirRef::Chain(p) = parent {
            self.check_data_cluster(p)?;
        }
        self.zero_cluster(disk, cluster)?;
        let mut sec = [0u8; SECTOR_SIZE];
        DirEntry::new_dir(DOT_NAME, cluster).encode(&mut sec[..DIR_ENTRY_SIZE])?;
        DirEntry::new_dir(DOTDOT_NAME, parent.cluster()).encode(&mut sec[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE])?;
        write_sector(disk, self.cluster_to_lba(cluster), &sec)
    }

    /// First reusable root slot (deleted or past the end marker). The root
    /// region cannot grow, so running out is `Full`.
    pub fn find_free_slot_in_root<D: BlockDev>(&self, disk: &mut D) -> Result<SlotPos, FsError> {
        let mut cursor = DirCursor::begin_root(self);
        first_free(self, disk, &mut cursor)?.ok_or(FsError::Full)
    }

    /// Same scan over a subdirectory's chain. Exhausting the chain is not an
    /// error: the caller extends it.
    pub fn find_free_slot_in_chain<D: BlockDev>(&self, disk: &mut D, first_cluster: u16) -> Result<SlotSearch, FsError> {
        let mut cursor = DirCursor::begin_chain(self, first_cluster)?;
        match first_free(self, disk, &mut cursor)? {
            Some(pos) => Ok(SlotSearch::Found(pos)),
            None => Ok(SlotSearch::NeedsExtension {
                last_cluster: cursor.chain_cluster().unwrap_or(first_cluster),
            }),
        }
    }

    /// Free slot in `dir`, growing a chained directory by one cluster if needed.
    fn claim_slot<D: BlockDev>(&self, disk: &mut D, dir: DirRef) -> Result<SlotPos, FsError> {
        let first_cluster = match dir {
            DirRef::Root => return self.find_free_slot_in_root(disk),
            DirRef::Chain(c) => c,
        };
        match self.find_free_slot_in_chain(disk, first_cluster)? {
            SlotSearch::Found(pos) => Ok(pos),
            SlotSearch::NeedsExtension { last_cluster } => {
                let new = self.extend_chain(disk, last_cluster)?;
                Ok(SlotPos { lba: self.cluster_to_lba(new), index: 0 })
            }
        }
    }

    pub fn write_entry<D: BlockDev>(&self, disk: &mut D, pos: SlotPos, entry: &DirEntry) -> Result<(), FsError> {
        let mut sec = [0u8; SECTOR_SIZE];
        read_sector(disk, pos.lba, &mut sec)?;
        let off = pos.index * DIR_ENTRY_SIZE;
        entry.encode(&mut sec[off..off + DIR_ENTRY_SIZE])?;
        write_sector(disk, pos.lba, &sec)
    }

    /// Create an empty directory at `path` and return its first cluster.
    pub fn mkdir<D: BlockDev>(&self, disk: &mut D, path: &str) -> Result<u16, FsError> {
        match resolve(self, disk, path) {
            Ok(_) => return Err(FsError::AlreadyExists),
            Err(FsError::NotFound) => {}
            Err(e) => return Err(e),
        }
        let (parent_path, leaf) = split_leaf(path).ok_or(FsError::AlreadyExists)?;
        let parent = resolve(self, disk, parent_path)?.as_dir()?;
        let name = encode_8_3(leaf)?;

        let pos = self.claim_slot(disk, parent)?;
        let cluster = self.allocate_cluster(disk)?;
        self.init_directory_cluster(disk, cluster, parent)?;
        self.write_entry(disk, pos, &DirEntry::new_dir(name, cluster))?;
        Ok(cluster)
    }
}

fn first_free<D: BlockDev>(vol: &Volume, disk: &mut D, cursor: &mut DirCursor) -> Result<Option<SlotPos>, FsError> {
    while let Some((pos, slot)) = cursor.next_slot(vol, disk)? {
        if slot.is_free() {
            return Ok(Some(pos));
        }
    }
    Ok(None)
}
