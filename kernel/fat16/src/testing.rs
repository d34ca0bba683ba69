//! In-memory disks and image builders shared by the unit tests.

use std::io::Cursor;
use std::vec;
use std::vec::Vec;

use crate::block_dev::{BlockDev, DiskError};
use crate::consts::{DIR_ENTRY_SIZE, FAT16_EOC, FAT16_EOC_MARK, SECTOR_SIZE};
use crate::entry::Slot;
use crate::name::encode_8_3;
use crate::volume::Volume;

/// Vec-backed disk with a write log and single-sector fault injection.
#[derive(Clone)]
pub struct MemDisk {
    pub data:           Vec<u8>,
    /// Reported to the driver; the backing store is always 512-byte sectors.
    pub sector_size:    u32,
    /// Writes touching this LBA fail with `DiskError::Device`.
    pub fail_writes_at: Option<u64>,
    /// LBA of every successful single-sector write, in order.
    pub writes:         Vec<u64>,
    pub reads:          usize,
}

impl MemDisk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, sector_size: SECTOR_SIZE as u32, fail_writes_at: None, writes: Vec::new(), reads: 0 }
    }

    fn range(&self, lba: u64, count: u32) -> Result<core::ops::Range<usize>, DiskError> {
        let start = lba as usize * SECTOR_SIZE;
        let end = start + count as usize * SECTOR_SIZE;
        if end > self.data.len() {
            return Err(DiskError::OutOfRange);
        }
        Ok(start..end)
    }

    fn fat_offset(vol: &Volume, copy: u8, cluster: u16) -> usize {
        (vol.fat_lba + copy as u64 * vol.fat_size as u64) as usize * SECTOR_SIZE + cluster as usize * 2
    }

    pub fn fat_copy_entry(&self, vol: &Volume, copy: u8, cluster: u16) -> u16 {
        let off = Self::fat_offset(vol, copy, cluster);
        u16::from_le_bytes([self.data[off], self.data[off + 1]])
    }

    pub fn put_fat_copy(&mut self, vol: &Volume, copy: u8, cluster: u16, value: u16) {
        let off = Self::fat_offset(vol, copy, cluster);
        self.data[off..off + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Same value in every FAT copy.
    pub fn put_fat(&mut self, vol: &Volume, cluster: u16, value: u16) {
        for copy in 0..vol.num_fats {
            self.put_fat_copy(vol, copy, cluster, value);
        }
    }

    pub fn put_entry(&mut self, lba: u64, index: usize, name: &[u8; 11], attr: u8, cluster: u16, size: u32) {
        let off = lba as usize * SECTOR_SIZE + index * DIR_ENTRY_SIZE;
        let raw = &mut self.data[off..off + DIR_ENTRY_SIZE];
        raw.fill(0);
        raw[..11].copy_from_slice(name);
        raw[11] = attr;
        raw[26..28].copy_from_slice(&cluster.to_le_bytes());
        raw[28..32].copy_from_slice(&size.to_le_bytes());
    }

    pub fn slot(&self, lba: u64, index: usize) -> Slot {
        let off = lba as usize * SECTOR_SIZE + index * DIR_ENTRY_SIZE;
        Slot::decode(&self.data[off..off + DIR_ENTRY_SIZE]).unwrap()
    }

    /// Copy `bytes` to the start of `cluster`.
    pub fn fill_cluster(&mut self, vol: &Volume, cluster: u16, bytes: &[u8]) {
        assert!(bytes.len() <= vol.cluster_bytes() as usize);
        let off = vol.cluster_to_lba(cluster) as usize * SECTOR_SIZE;
        self.data[off..off + bytes.len()].copy_from_slice(bytes);
    }
}

impl BlockDev for MemDisk {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn read(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<(), DiskError> {
        let range = self.range(lba, count)?;
        buf.copy_from_slice(&self.data[range]);
        self.reads += 1;
        Ok(())
    }

    fn write(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<(), DiskError> {
        let range = self.range(lba, count)?;
        if self.fail_writes_at.is_some_and(|bad| (lba..lba + count as u64).contains(&bad)) {
            return Err(DiskError::Device);
        }
        self.data[range].copy_from_slice(buf);
        self.writes.extend(lba..lba + count as u64);
        Ok(())
    }
}

/// `"ls.elf"` → `b"LS      ELF"`.
pub fn name11(name: &str) -> [u8; 11] {
    encode_8_3(name).unwrap()
}

/// Hand-assembled FAT16 image, small enough to corrupt byte by byte.
pub struct ImageBuilder {
    spc:          u8,
    reserved:     u16,
    fats:         u8,
    fat_size:     u16,
    root_entries: u16,
    data_sectors: u32,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self { spc: 1, reserved: 1, fats: 2, fat_size: 1, root_entries: 16, data_sectors: 64 }
    }

    pub fn sectors_per_cluster(mut self, spc: u8) -> Self { self.spc = spc; self }
    pub fn reserved(mut self, n: u16) -> Self { self.reserved = n; self }
    pub fn fats(mut self, n: u8) -> Self { self.fats = n; self }
    pub fn fat_size(mut self, n: u16) -> Self { self.fat_size = n; self }
    pub fn root_entries(mut self, n: u16) -> Self { self.root_entries = n; self }
    pub fn data_sectors(mut self, n: u32) -> Self { self.data_sectors = n; self }

    pub fn build(self) -> MemDisk {
        let root_sectors = (self.root_entries as u32 * DIR_ENTRY_SIZE as u32).div_ceil(SECTOR_SIZE as u32);
        let total = self.reserved as u32
            + self.fats as u32 * self.fat_size as u32
            + root_sectors
            + self.data_sectors;
        let mut data = vec![0u8; total as usize * SECTOR_SIZE];

        let bs = &mut data[..SECTOR_SIZE];
        bs[..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        bs[3..11].copy_from_slice(b"MEMDISK ");
        bs[11..13].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
        bs[13] = self.spc;
        bs[14..16].copy_from_slice(&self.reserved.to_le_bytes());
        bs[16] = self.fats;
        bs[17..19].copy_from_slice(&self.root_entries.to_le_bytes());
        if total < 0x10000 {
            bs[19..21].copy_from_slice(&(total as u16).to_le_bytes());
        } else {
            bs[32..36].copy_from_slice(&total.to_le_bytes());
        }
        bs[21] = 0xF8;
        bs[22..24].copy_from_slice(&self.fat_size.to_le_bytes());
        bs[510] = 0x55;
        bs[511] = 0xAA;

        for copy in 0..self.fats as usize {
            let off = (self.reserved as usize + copy * self.fat_size as usize) * SECTOR_SIZE;
            data[off..off + 2].copy_from_slice(&FAT16_EOC.to_le_bytes());
            data[off + 2..off + 4].copy_from_slice(&FAT16_EOC_MARK.to_le_bytes());
        }
        MemDisk::new(data)
    }
}

const FATFS_IMAGE_SIZE: usize = 16 * 1024 * 1024;

/// Empty FAT16 volume formatted by `fatfs`: 16 MiB, 1 KiB clusters.
pub fn fatfs_image() -> MemDisk {
    let mut cursor = Cursor::new(vec![0u8; FATFS_IMAGE_SIZE]);
    fatfs::format_volume(
        &mut cursor,
        fatfs::FormatVolumeOptions::new()
            .fat_type(fatfs::FatType::Fat16)
            .bytes_per_cluster(1024),
    ).expect("format_volume failed");
    MemDisk::new(cursor.into_inner())
}

pub type FatfsVolume<'a> = fatfs::FileSystem<Cursor<&'a mut Vec<u8>>>;

/// Open `disk` with `fatfs`, run `f`, and flush before returning.
pub fn with_fatfs<R>(disk: &mut MemDisk, f: impl FnOnce(&FatfsVolume<'_>) -> R) -> R {
    let fs = fatfs::FileSystem::new(Cursor::new(&mut disk.data), fatfs::FsOptions::new())
        .expect("FileSystem::new failed");
    let out = f(&fs);
    fs.unmount().expect("unmount failed");
    out
}
