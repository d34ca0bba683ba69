//! Boot sector parsing and region layout.
//!
//! # Boot sector fields used (little-endian)
//! - 11: bytes per sector (u16, must be 512)
//! - 13: sectors per cluster (u8)
//! - 14: reserved sectors (u16)
//! - 16: FAT copies (u8)
//! - 17: root entry capacity (u16)
//! - 19: total sectors, 16-bit (u16, 0 when the 32-bit field is used)
//! - 22: sectors per FAT copy (u16)
//! - 32: total sectors, 32-bit (u32)
//! - 510: signature 0x55 0xAA

use crate::block_dev::{BlockDev, Sector, le16, le32, read_sector};
use crate::consts::{BOOT_SIGNATURE, DIR_ENTRY_SIZE, FAT_ENTRIES_PER_SECTOR, FAT16_BAD, FIRST_DATA_CLUSTER, SECTOR_SIZE};
use crate::error::FsError;

/// Geometry of a mounted FAT16 volume. Derived fields are computed once by
/// [`Volume::mount`] and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub base_lba:            u64,
    pub bytes_per_sector:    u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors:    u16,
    pub num_fats:            u8,
    pub root_entry_count:    u16,
    /// Sectors per FAT copy.
    pub fat_size:            u16,
    /// 0 when the boot sector leaves both total-sector fields empty.
    pub total_sectors:       u32,

    pub fat_lba:      u64,
    pub root_lba:     u64,
    pub root_sectors: u32,
    pub data_lba:     u64,
    /// Highest cluster number that maps inside both the FAT and the volume.
    pub max_cluster:  u16,
}

impl Volume {
    /// Read the boot sector at `base_lba` and derive the region layout.
    pub fn mount<D: BlockDev>(disk: &mut D, base_lba: u64) -> Result<Self, FsError> {
        let mut sec = [0u8; SECTOR_SIZE];
        read_sector(disk, base_lba, &mut sec)?;
        Self::parse(base_lba, &sec)
    }

    pub fn parse(base_lba: u64, sec: &Sector) -> Result<Self, FsError> {
        if sec[510..512] != BOOT_SIGNATURE {
            return Err(FsError::BadSignature);
        }

        let bytes_per_sector    = le16(sec, 11);
        let sectors_per_cluster = sec[13];
        let reserved_sectors    = le16(sec, 14);
        let num_fats            = sec[16];
        let root_entry_count    = le16(sec, 17);
        let total_sectors_16    = le16(sec, 19);
        let fat_size            = le16(sec, 22);
        let total_sectors_32    = le32(sec, 32);

        if bytes_per_sector as usize != SECTOR_SIZE { return Err(FsError::FormatError); }
        if sectors_per_cluster == 0 || num_fats == 0 || fat_size == 0 {
            return Err(FsError::FormatError);
        }

        let total_sectors = if total_sectors_16 != 0 { total_sectors_16 as u32 } else { total_sectors_32 };

        let bps = bytes_per_sector as u32;
        let fat_lba      = base_lba + reserved_sectors as u64;
        let root_sectors = (root_entry_count as u32 * DIR_ENTRY_SIZE as u32).div_ceil(bps);
        let root_lba     = fat_lba + num_fats as u64 * fat_size as u64;
        let data_lba     = root_lba + root_sectors as u64;

        // Cluster numbering starts at 2, so the highest addressable cluster
        // is the entry count minus one, capped below the bad-cluster marker.
        let fat_limit = (fat_size as u32 * FAT_ENTRIES_PER_SECTOR as u32 - 1).min(FAT16_BAD as u32 - 1);
        let data_offset = data_lba - base_lba;
        let max_cluster = if total_sectors as u64 > data_offset {
            let clusters = (total_sectors as u64 - data_offset) / sectors_per_cluster as u64;
            (clusters + 1).min(fat_limit as u64) as u32
        } else {
            fat_limit
        };
        if max_cluster < FIRST_DATA_CLUSTER as u32 {
            return Err(FsError::FormatError);
        }

        Ok(Self {
            base_lba, bytes_per_sector, sectors_per_cluster, reserved_sectors,
            num_fats, root_entry_count, fat_size, total_sectors,
            fat_lba, root_lba, root_sectors, data_lba,
            max_cluster: max_cluster as u16,
        })
    }

    /// First block of `cluster`. Only meaningful for data clusters; callers
    /// outside this module go through [`Volume::check_data_cluster`] first.
    pub fn cluster_to_lba(&self, cluster: u16) -> u64 {
        self.data_lba + (cluster - FIRST_DATA_CLUSTER) as u64 * self.sectors_per_cluster as u64
    }

    pub fn sectors_per_cluster(&self) -> u32 {
        self.sectors_per_cluster as u32
    }

    pub fn cluster_bytes(&self) -> u32 {
        self.sectors_per_cluster() * SECTOR_SIZE as u32
    }

    /// Number of usable data clusters; also the longest chain a walk may follow.
    pub fn cluster_count(&self) -> u32 {
        self.max_cluster as u32 - 1
    }

    pub fn is_data_cluster(&self, cluster: u16) -> bool {
        (FIRST_DATA_CLUSTER..=self.max_cluster).contains(&cluster)
    }

    /// `InvalidCluster` for the reserved numbers 0 and 1, `AllocationInconsistency`
    /// past the end of the volume.
    pub fn check_data_cluster(&self, cluster: u16) -> Result<(), FsError> {
        if cluster < FIRST_DATA_CLUSTER {
            return Err(FsError::InvalidCluster);
        }
        if cluster > self.max_cluster {
            return Err(FsError::AllocationInconsistency);
        }
        Ok(())
    }
}
