//! Cluster-chain navigation over the 16-bit File Allocation Table.

use crate::block_dev::{BlockDev, le16, read_sector, write_sector};
use crate::consts::{FAT16_EOC, FIRST_DATA_CLUSTER, SECTOR_SIZE};
use crate::error::FsError;
use crate::volume::Volume;

/// Classification of a raw table value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    /// Allocated and linked to this data cluster.
    Next(u16),
    EndOfChain,
    /// Reserved (1), bad (0xFFF7) or beyond the end of the volume.
    Invalid(u16),
}

impl FatEntry {
    pub fn classify(raw: u16, max_cluster: u16) -> Self {
        match raw {
            0 => FatEntry::Free,
            v if is_end_of_chain(v) => FatEntry::EndOfChain,
            v if (FIRST_DATA_CLUSTER..=max_cluster).contains(&v) => FatEntry::Next(v),
            v => FatEntry::Invalid(v),
        }
    }
}

pub fn is_end_of_chain(value: u16) -> bool {
    value >= FAT16_EOC
}

impl Volume {
    /// Sector (relative to one FAT copy) and byte index of `cluster`'s entry.
    fn fat_entry_location(&self, cluster: u16) -> (u64, usize) {
        let offset = cluster as u64 * 2;
        (offset / SECTOR_SIZE as u64, (offset % SECTOR_SIZE as u64) as usize)
    }

    /// Raw table value for `cluster`.
    ///
    /// When the primary copy reads 0 and a mirror exists, a non-zero mirror
    /// value wins. That masks a torn mirrored write rather than detecting it;
    /// the substitution is logged.
    pub fn next_cluster<D: BlockDev>(&self, disk: &mut D, cluster: u16) -> Result<u16, FsError> {
        let (sector, idx) = self.fat_entry_location(cluster);
        let mut sec = [0u8; SECTOR_SIZE];
        read_sector(disk, self.fat_lba + sector, &mut sec)?;
        let value = le16(&sec, idx);
        if value != 0 || self.num_fats < 2 {
            return Ok(value);
        }

        read_sector(disk, self.fat_lba + self.fat_size as u64 + sector, &mut sec)?;
        let mirror = le16(&sec, idx);
        if mirror != 0 {
            log::warn!("fat16: cluster {} free in FAT 0 but {:#06x} in FAT 1, using mirror", cluster, mirror);
        }
        Ok(mirror)
    }

    /// Write `value` into `cluster`'s entry in every FAT copy, one
    /// read-modify-write per copy. A failure leaves earlier copies updated.
    pub fn set_fat_entry<D: BlockDev>(&self, disk: &mut D, cluster: u16, value: u16) -> Result<(), FsError> {
        let (sector, idx) = self.fat_entry_location(cluster);
        let mut sec = [0u8; SECTOR_SIZE];
        for copy in 0..self.num_fats as u64 {
            let lba = self.fat_lba + copy * self.fat_size as u64 + sector;
            read_sector(disk, lba, &mut sec)?;
            sec[idx..idx + 2].copy_from_slice(&value.to_le_bytes());
            write_sector(disk, lba, &sec)?;
        }
        Ok(())
    }

    /// Follow one link of a chain that must be valid: `Some(next)` for a data
    /// cluster, `None` at end-of-chain, `AllocationInconsistency` otherwise.
    pub fn follow<D: BlockDev>(&self, disk: &mut D, cluster: u16) -> Result<Option<u16>, FsError> {
        match FatEntry::classify(self.next_cluster(disk, cluster)?, self.max_cluster) {
            FatEntry::Next(next) => Ok(Some(next)),
            FatEntry::EndOfChain => Ok(None),
            FatEntry::Free | FatEntry::Invalid(_) => Err(FsError::AllocationInconsistency),
        }
    }
}
