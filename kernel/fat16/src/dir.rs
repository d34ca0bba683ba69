//! Restartable directory cursor over both FAT16 directory layouts: the
//! fixed root region and cluster-chained subdirectories.

use crate::block_dev::{BlockDev, Sector, read_sector};
use crate::consts::{DIR_ENTRY_SIZE, ENTRIES_PER_SECTOR, SECTOR_SIZE};
use crate::entry::{DirEntry, Slot};
use crate::error::FsError;
use crate::volume::Volume;

/// Which directory to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirRef {
    Root,
    Chain(u16),
}

impl DirRef {
    /// First-cluster value 0 in a `..` entry (or the root pseudo-entry) means the root region.
    pub fn from_cluster(cluster: u16) -> Self {
        if cluster == 0 { DirRef::Root } else { DirRef::Chain(cluster) }
    }

    /// Value stored in a child's `..` entry.
    pub fn cluster(self) -> u16 {
        match self {
            DirRef::Root => 0,
            DirRef::Chain(c) => c,
        }
    }
}

/// Location of one 32-byte slot on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPos {
    pub lba:   u64,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Root { remaining: u32 },
    Chain { cluster: u16, sector_in_cluster: u32, hops: u32 },
}

pub struct DirCursor {
    layout:  Layout,
    buf:     Sector,
    buf_lba: Option<u64>,
    index:   usize,
    done:    bool,
}

impl DirCursor {
    pub fn begin_root(vol: &Volume) -> Self {
        Self::with_layout(Layout::Root { remaining: vol.root_entry_count as u32 })
    }

    pub fn begin_chain(vol: &Volume, first_cluster: u16) -> Result<Self, FsError> {
        vol.check_data_cluster(first_cluster)?;
        Ok(Self::with_layout(Layout::Chain { cluster: first_cluster, sector_in_cluster: 0, hops: 0 }))
    }

    pub fn begin(vol: &Volume, dir: DirRef) -> Result<Self, FsError> {
        match dir {
            DirRef::Root => Ok(Self::begin_root(vol)),
            DirRef::Chain(cluster) => Self::begin_chain(vol, cluster),
        }
    }

    fn with_layout(layout: Layout) -> Self {
        Self { layout, buf: [0; SECTOR_SIZE], buf_lba: None, index: 0, done: false }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn finish(&mut self) {
        self.done = true;
    }

    /// Cluster currently being walked; after the chain is exhausted, its last cluster.
    pub fn chain_cluster(&self) -> Option<u16> {
        match self.layout {
            Layout::Root { .. } => None,
            Layout::Chain { cluster, .. } => Some(cluster),
        }
    }

    /// Next live entry, skipping deleted, long-name and volume-label slots.
    /// `None` once the end marker or the end of storage is reached; every
    /// later call returns `None` too.
    pub fn next<D: BlockDev>(&mut self, vol: &Volume, disk: &mut D) -> Result<Option<DirEntry>, FsError> {
        while let Some((_, slot)) = self.next_slot(vol, disk)? {
            match slot {
                Slot::End => {
                    self.done = true;
                    return Ok(None);
                }
                Slot::Entry(entry) => return Ok(Some(entry)),
                Slot::Deleted | Slot::LongName | Slot::VolumeLabel => {}
            }
        }
        Ok(None)
    }

    /// Every slot in storage order, markers included. Unlike [`DirCursor::next`]
    /// this does not stop at the end marker; it runs until the root region or
    /// the chain is exhausted.
    pub fn next_slot<D: BlockDev>(&mut self, vol: &Volume, disk: &mut D) -> Result<Option<(SlotPos, Slot)>, FsError> {
        loop {
            if self.done {
                return Ok(None);
            }

            let lba = match self.layout {
                Layout::Root { remaining } => {
                    if remaining == 0 {
                        self.done = true;
                        return Ok(None);
                    }
                    let consumed = vol.root_entry_count as u32 - remaining;
                    vol.root_lba + (consumed / ENTRIES_PER_SECTOR as u32) as u64
                }
                Layout::Chain { cluster, sector_in_cluster, .. } => {
                    vol.cluster_to_lba(cluster) + sector_in_cluster as u64
                }
            };
            self.load(disk, lba)?;

            if self.index < ENTRIES_PER_SECTOR {
                let index = self.index;
                self.index += 1;
                if let Layout::Root { remaining } = &mut self.layout {
                    *remaining -= 1;
                }
                let off = index * DIR_ENTRY_SIZE;
                let slot = Slot::decode(&self.buf[off..off + DIR_ENTRY_SIZE])?;
                return Ok(Some((SlotPos { lba, index }, slot)));
            }

            self.advance(vol, disk)?;
        }
    }

    fn load<D: BlockDev>(&mut self, disk: &mut D, lba: u64) -> Result<(), FsError> {
        if self.buf_lba == Some(lba) {
            return Ok(());
        }
        read_sector(disk, lba, &mut self.buf)?;
        self.buf_lba = Some(lba);
        self.index = 0;
        Ok(())
    }

    /// Move past an exhausted sector.
    fn advance<D: BlockDev>(&mut self, vol: &Volume, disk: &mut D) -> Result<(), FsError> {
        // Root sectors are contiguous; the next one follows from `remaining`.
        if let Layout::Chain { cluster, sector_in_cluster, hops } = &mut self.layout {
            *sector_in_cluster += 1;
            if *sector_in_cluster >= vol.sectors_per_cluster() {
                match vol.follow(disk, *cluster)? {
                    Some(next) => {
                        *hops += 1;
                        if *hops >= vol.cluster_count() {
                            return Err(FsError::AllocationInconsistency);
                        }
                        *cluster = next;
                        *sector_in_cluster = 0;
                    }
                    None => {
                        *sector_in_cluster -= 1;
                        self.done = true;
                    }
                }
            }
        }
        self.buf_lba = None;
        self.index = 0;
        Ok(())
    }
}

/// Borrowing iterator over a directory's live entries.
pub struct Entries<'a, D> {
    vol:    &'a Volume,
    disk:   &'a mut D,
    cursor: DirCursor,
}

impl<'a, D: BlockDev> Entries<'a, D> {
    pub fn new(vol: &'a Volume, disk: &'a mut D, dir: DirRef) -> Result<Self, FsError> {
        Ok(Self { vol, disk, cursor: DirCursor::begin(vol, dir)? })
    }
}

impl<D: BlockDev> Iterator for Entries<'_, D> {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next(self.vol, &mut *self.disk) {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.cursor.finish();
                Some(Err(e))
            }
        }
    }
}
