//! Block device abstraction.
//!
//! All disk I/O goes through `BlockDev`, which keeps every layer above it
//! testable against an in-memory disk.

use crate::consts::SECTOR_SIZE;
use crate::error::FsError;

pub type Sector = [u8; SECTOR_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// LBA range lies outside the device.
    OutOfRange,
    /// The controller reported an error or timed out.
    Device,
}

/// Synchronous sector I/O by logical block address.
///
/// `buf` holds exactly `count * sector_size()` bytes.
pub trait BlockDev {
    fn sector_size(&self) -> u32 {
        SECTOR_SIZE as u32
    }
    fn read(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<(), DiskError>;
    fn write(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<(), DiskError>;
}

impl<D: BlockDev + ?Sized> BlockDev for &mut D {
    fn sector_size(&self) -> u32 {
        (**self).sector_size()
    }
    fn read(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<(), DiskError> {
        (**self).read(lba, count, buf)
    }
    fn write(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<(), DiskError> {
        (**self).write(lba, count, buf)
    }
}

/// A slice of a disk found by partition discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start_block: u64,
    pub block_count: u64,
    /// MBR type byte; 0 for GPT partitions.
    pub type_tag: u8,
}

fn check_sector_size<D: BlockDev>(disk: &D) -> Result<(), FsError> {
    match disk.sector_size() {
        s if s as usize == SECTOR_SIZE => Ok(()),
        s => Err(FsError::SectorSize(s)),
    }
}

pub(crate) fn read_sector<D: BlockDev>(disk: &mut D, lba: u64, buf: &mut Sector) -> Result<(), FsError> {
    check_sector_size(disk)?;
    disk.read(lba, 1, buf)?;
    Ok(())
}

pub(crate) fn write_sector<D: BlockDev>(disk: &mut D, lba: u64, buf: &Sector) -> Result<(), FsError> {
    check_sector_size(disk)?;
    disk.write(lba, 1, buf)?;
    Ok(())
}

pub(crate) fn le16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

pub(crate) fn le32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}
