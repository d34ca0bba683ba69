//! FAT16 filesystem driver for the kernel's root volume.
//!
//! Layering, leaves first: `block_dev` (sector I/O) → `volume` (boot sector
//! geometry) → `fat` (cluster chains) → `dir` (directory cursor) →
//! `resolve` (path lookup) → `data` / `mutate` → `fs` (the facade the rest of
//! the kernel calls).
//!
//! Everything operates on fixed 512-byte stack buffers. The only heap
//! allocation is the whole-file buffer returned by [`Fs::read_file`].
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod block_dev;
pub mod consts;
pub mod context;
pub mod data;
pub mod dir;
pub mod entry;
pub mod error;
pub mod fat;
pub mod fs;
pub mod mutate;
pub mod name;
pub mod path;
pub mod resolve;
pub mod volume;

#[cfg(test)]
mod testing;

pub use block_dev::{BlockDev, DiskError, Partition};
pub use context::TaskContext;
pub use dir::{DirCursor, DirRef};
pub use entry::{Attr, DirEntry, ShortName};
pub use error::FsError;
pub use fs::{DiskPorts, Fs, ReadDir, RootSpec};
pub use resolve::Resolved;
pub use volume::Volume;
