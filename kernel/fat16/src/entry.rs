//! On-disk directory records (32 bytes each).
//!
//! ```text
//!  0..11  name (8-byte stem + 3-byte extension, space padded)
//! 11      attributes
//! 12..20  NT flags, creation/access stamps (ignored)
//! 20..22  first cluster, high word (always 0 on FAT16)
//! 22..26  modification stamp (ignored)
//! 26..28  first cluster, low word
//! 28..32  size in bytes
//! ```

use bitflags::bitflags;
use kernel_api_types::fs::EntryKind;

use crate::block_dev::{le16, le32};
use crate::consts::{DIR_ENTRY_SIZE, SLOT_DELETED, SLOT_END};
use crate::error::FsError;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attr: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;

        /// Marker value of a long-name fragment.
        const LONG_NAME = Self::READ_ONLY.bits() | Self::HIDDEN.bits()
            | Self::SYSTEM.bits() | Self::VOLUME_ID.bits();

        // The disk may set any bits
        const _ = !0;
    }
}

/// Display form of an 8.3 name, e.g. `"README.TXT"`.
pub type ShortName = heapless::String<12>;

pub const DOT_NAME: [u8; 11]    = *b".          ";
pub const DOTDOT_NAME: [u8; 11] = *b"..         ";

/// A live short-name entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name:    [u8; 11],
    pub attr:    Attr,
    pub cluster: u16,
    pub size:    u32,
}

/// What one directory slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Name byte 0x00: this and every later slot are unused.
    End,
    /// Name byte 0xE5.
    Deleted,
    LongName,
    VolumeLabel,
    Entry(DirEntry),
}

impl Slot {
    pub fn decode(raw: &[u8]) -> Result<Self, FsError> {
        if raw.len() < DIR_ENTRY_SIZE {
            return Err(FsError::FormatError);
        }
        let attr = Attr::from_bits_retain(raw[11]);
        Ok(match raw[0] {
            SLOT_END => Slot::End,
            SLOT_DELETED => Slot::Deleted,
            _ if attr.bits() & 0x3F == Attr::LONG_NAME.bits() => Slot::LongName,
            _ if attr.contains(Attr::VOLUME_ID) => Slot::VolumeLabel,
            _ => {
                let mut name = [0u8; 11];
                name.copy_from_slice(&raw[..11]);
                Slot::Entry(DirEntry { name, attr, cluster: le16(raw, 26), size: le32(raw, 28) })
            }
        })
    }

    /// Free for reuse by a new entry.
    pub fn is_free(&self) -> bool {
        matches!(self, Slot::End | Slot::Deleted)
    }
}

impl DirEntry {
    pub fn new_dir(name: [u8; 11], cluster: u16) -> Self {
        Self { name, attr: Attr::DIRECTORY, cluster, size: 0 }
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<(), FsError> {
        if out.len() < DIR_ENTRY_SIZE {
            return Err(FsError::FormatError);
        }
        let out = &mut out[..DIR_ENTRY_SIZE];
        out.fill(0);
        out[..11].copy_from_slice(&self.name);
        out[11] = self.attr.bits();
        out[26..28].copy_from_slice(&self.cluster.to_le_bytes());
        out[28..32].copy_from_slice(&self.size.to_le_bytes());
        Ok(())
    }

    pub fn is_dir(&self) -> bool {
        self.attr.contains(Attr::DIRECTORY)
    }

    pub fn kind(&self) -> EntryKind {
        if self.is_dir() { EntryKind::Directory } else { EntryKind::File }
    }

    /// `.` or `..`
    pub fn is_dot(&self) -> bool {
        self.name == DOT_NAME || self.name == DOTDOT_NAME
    }

    pub fn display_name(&self) -> ShortName {
        display_name(&self.name)
    }
}

/// `"README  TXT"` → `"README.TXT"`, `"BIN        "` → `"BIN"`.
///
/// Bytes outside printable ASCII show as `?`, so the result always fits.
pub fn display_name(name11: &[u8; 11]) -> ShortName {
    let mut out = ShortName::new();
    let printable = |b: u8| if (0x20..0x7F).contains(&b) { b as char } else { '?' };

    for &b in name11[..8].iter().take_while(|&&b| b != b' ') {
        let _ = out.push(printable(b));
    }
    let ext = &name11[8..];
    if ext.iter().any(|&b| b != b' ') {
        let _ = out.push('.');
        for &b in ext.iter().take_while(|&&b| b != b' ') {
            let _ = out.push(printable(b));
        }
    }
    out
}
