#![no_std]

#[cfg(test)]
extern crate std;

pub mod fs;

/// Longest path (in bytes, excluding the terminator) accepted at the syscall boundary.
pub const PATH_MAX: usize = 256;

/// Capacity of a task's current-directory string.
pub const CWD_MAX: usize = 128;
