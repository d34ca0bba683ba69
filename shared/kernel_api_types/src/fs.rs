use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Capacity of the null-terminated name in a [`DirEntRecord`].
pub const NAME_MAX: usize = 64;

/// Kind tag carried by [`DirEntRecord::kind`] and [`FsStat::kind`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum EntryKind {
    File      = 1,
    Directory = 2,
}

/// Result codes returned by the filesystem syscalls.
///
/// Success is `Ok`; every other value is reported to user space as its
/// negated discriminant (see [`FsResult::code`]).
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum FsResult {
    Ok                      = 0,
    IoError                 = 1,
    BadSignature            = 2,
    FormatError             = 3,
    NotFound                = 4,
    NotADirectory           = 5,
    IsADirectory            = 6,
    AlreadyExists           = 7,
    NameTooLong             = 8,
    BadComponent            = 9,
    NoSpace                 = 10,
    Full                    = 11,
    AllocationInconsistency = 12,
    EndOfFile               = 13,
    InvalidArgument         = 14,
}

impl FsResult {
    /// Negative error code for the syscall ABI; `0` for `Ok`.
    pub fn code(self) -> i32 {
        -(i32::from(self))
    }

    /// Inverse of [`FsResult::code`]. Unknown codes collapse to `IoError`.
    pub fn from_code(code: i32) -> Self {
        FsResult::try_from(code.wrapping_neg()).unwrap_or(FsResult::IoError)
    }
}

/// `stat` result handed to kernel callers and user space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FsStat {
    pub kind: EntryKind,
    pub size: u32,
}

/// One directory entry as delivered to user-level listing programs.
///
/// Fixed layout: 64-byte null-terminated name, 32-bit size, 1-byte kind
/// tag, 3 bytes padding (72 bytes total).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DirEntRecord {
    pub name: [u8; NAME_MAX],
    pub size: u32,
    pub kind: u8,
    pub _pad: [u8; 3],
}

impl DirEntRecord {
    pub const EMPTY: Self = Self { name: [0; NAME_MAX], size: 0, kind: 0, _pad: [0; 3] };

    /// Build a record, truncating `name` so the terminator always fits.
    pub fn new(name: &str, kind: EntryKind, size: u32) -> Self {
        let mut rec = Self::EMPTY;
        let len = name.len().min(NAME_MAX - 1);
        rec.name[..len].copy_from_slice(&name.as_bytes()[..len]);
        rec.kind = kind.into();
        rec.size = size;
        rec
    }

    /// The name up to (not including) the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_MAX);
        &self.name[..end]
    }

    pub fn kind(&self) -> Option<EntryKind> {
        EntryKind::try_from(self.kind).ok()
    }
}
