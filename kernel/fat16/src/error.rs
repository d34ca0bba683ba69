use kernel_api_types::fs::FsResult;

use crate::block_dev::DiskError;

/// Everything the driver can report. No layer retries or guesses around an
/// error except the FAT mirror read in [`crate::fat`]; each helper hands it
/// straight to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// The block device failed the transfer.
    Io(DiskError),
    /// The block device does not use 512-byte sectors.
    SectorSize(u32),
    /// Boot sector lacks the 0x55AA trailer.
    BadSignature,
    /// Boot sector geometry is unusable.
    FormatError,
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    /// 8.3 stem longer than 8 or extension longer than 3.
    NameTooLong,
    /// Component is empty or holds a character a short name cannot carry.
    BadComponent,
    /// Path does not fit the fixed normalization buffer.
    PathTooLong,
    /// No free cluster left in the FAT.
    NoSpace,
    /// Root directory has no free slot (it cannot grow).
    Full,
    /// A chain points at a free, reserved, bad or out-of-range cluster, or loops.
    AllocationInconsistency,
    /// A chain ended before the requested data or directory slot was reached.
    UnexpectedEnd,
    /// Offset read starts at or past the recorded file size.
    EndOfFile,
    /// Caller supplied a cluster number below 2 where a data cluster is required.
    InvalidCluster,
    /// Heap refused the whole-file buffer.
    OutOfMemory,
    /// Root selection string is neither empty, `esp` nor `partuuid=...`.
    UnsupportedRootSpec,
}

impl From<DiskError> for FsError {
    fn from(err: DiskError) -> Self {
        FsError::Io(err)
    }
}

impl FsError {
    /// Code reported across the syscall boundary.
    pub fn result(self) -> FsResult {
        match self {
            FsError::Io(_) | FsError::SectorSize(_) | FsError::UnexpectedEnd => FsResult::IoError,
            FsError::BadSignature => FsResult::BadSignature,
            FsError::FormatError => FsResult::FormatError,
            FsError::NotFound => FsResult::NotFound,
            FsError::NotADirectory => FsResult::NotADirectory,
            FsError::IsADirectory => FsResult::IsADirectory,
            FsError::AlreadyExists => FsResult::AlreadyExists,
            FsError::NameTooLong | FsError::PathTooLong => FsResult::NameTooLong,
            FsError::BadComponent => FsResult::BadComponent,
            FsError::NoSpace | FsError::OutOfMemory => FsResult::NoSpace,
            FsError::Full => FsResult::Full,
            FsError::AllocationInconsistency => FsResult::AllocationInconsistency,
            FsError::EndOfFile => FsResult::EndOfFile,
            FsError::InvalidCluster | FsError::UnsupportedRootSpec => FsResult::InvalidArgument,
        }
    }

    /// Negative errno-style value, as returned by `listdir` and friends.
    pub fn code(self) -> i32 {
        self.result().code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative() {
        assert!(FsError::NotFound.code() < 0);
        assert_eq!(FsError::Io(DiskError::Device).result(), FsResult::IoError);
        assert_eq!(FsError::AllocationInconsistency.code(), FsResult::AllocationInconsistency.code());
    }

    #[test]
    fn disk_errors_convert() {
        let err: FsError = DiskError::OutOfRange.into();
        assert_eq!(err, FsError::Io(DiskError::OutOfRange));
    }
}
