//! Per-task filesystem state.

use core::ops::ControlFlow;

use kernel_api_types::CWD_MAX;
use kernel_api_types::fs::DirEntRecord;

use crate::block_dev::BlockDev;
use crate::error::FsError;
use crate::fs::Fs;
use crate::path::{AbsPath, join};

/// Current directory of one task. Relative paths from that task resolve
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    cwd: heapless::String<CWD_MAX>,
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskContext {
    pub fn new() -> Self {
        let mut cwd = heapless::String::new();
        let _ = cwd.push('/');
        Self { cwd }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Absolute form of `arg`; `""` and `"."` name the cwd itself.
    pub fn resolve(&self, arg: &str) -> Result<AbsPath, FsError> {
        join(&self.cwd, arg)
    }

    /// Change directory. The target must exist and be a directory; the cwd
    /// is untouched on failure.
    pub fn chdir<D: BlockDev>(&mut self, fs: &mut Fs<D>, arg: &str) -> Result<(), FsError> {
        let target = self.resolve(arg)?;
        fs.lookup(&target)?.as_dir()?;

        let mut cwd = heapless::String::new();
        cwd.push_str(&target).map_err(|_| FsError::PathTooLong)?;
        self.cwd = cwd;
        Ok(())
    }
}

impl<D: BlockDev> Fs<D> {
    /// Fill `out` with the entries of `path` (the cwd when `None`, empty or
    /// `"."`), stopping once `out` is full. Returns the number written.
    pub fn listdir_records(
        &mut self,
        ctx: &TaskContext,
        path: Option<&str>,
        out: &mut [DirEntRecord],
    ) -> Result<usize, FsError> {
        let target = ctx.resolve(path.unwrap_or(""))?;
        let mut n = 0;
        self.listdir(&target, |entry| {
            let Some(slot) = out.get_mut(n) else { return ControlFlow::Break(()) };
            let size = if entry.is_dir() { 0 } else { entry.size };
            *slot = DirEntRecord::new(&entry.display_name(), entry.kind(), size);
            n += 1;
            ControlFlow::Continue(())
        })
    }

    /// Syscall form of [`Fs::listdir_records`]: a count, or a negative code.
    pub fn sys_listdir(&mut self, ctx: &TaskContext, path: Option<&str>, out: &mut [DirEntRecord]) -> i32 {
        match self.listdir_records(ctx, path, out) {
            Ok(n) => n as i32,
            Err(e) => e.code(),
        }
    }
}
