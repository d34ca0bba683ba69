//! Caller path normalization.
//!
//! Everything above the resolver speaks in absolute paths (`/EFI/BOOT`);
//! the resolver wants root-relative uppercase ones (`EFI/BOOT`).

use kernel_api_types::PATH_MAX;

use crate::error::FsError;
use crate::resolve::components;

/// Absolute path: a leading `/`, single separators, no `.`/`..`, no trailing `/`.
pub type AbsPath = heapless::String<PATH_MAX>;
/// Root-relative uppercase path handed to the resolver.
pub type NormPath = heapless::String<PATH_MAX>;

struct Builder {
    out: AbsPath,
}

impl Builder {
    fn new() -> Self {
        let mut out = AbsPath::new();
        let _ = out.push('/');
        Self { out }
    }

    fn push_all(&mut self, path: &str) -> Result<(), FsError> {
        for comp in components(path) {
            match comp {
                "." => {}
                ".." => self.pop(),
                name => {
                    if self.out.len() > 1 {
                        self.out.push('/').map_err(|_| FsError::PathTooLong)?;
                    }
                    self.out.push_str(name).map_err(|_| FsError::PathTooLong)?;
                }
            }
        }
        Ok(())
    }

    /// Drop the last component; never past the root.
    fn pop(&mut self) {
        let keep = self.out.rfind('/').unwrap_or(0).max(1);
        self.out.truncate(keep);
    }
}

/// Normalize to absolute form, keeping case. `\` and `/` both separate.
pub fn absolute(path: &str) -> Result<AbsPath, FsError> {
    let mut b = Builder::new();
    b.push_all(path)?;
    Ok(b.out)
}

/// `rel` relative to the absolute directory `base`; a `rel` starting with a
/// separator ignores `base`.
pub fn join(base: &str, rel: &str) -> Result<AbsPath, FsError> {
    let mut b = Builder::new();
    if !rel.starts_with(['/', '\\']) {
        b.push_all(base)?;
    }
    b.push_all(rel)?;
    Ok(b.out)
}

/// `"/efi/./carlos/../boot/"` → `"EFI/BOOT"`.
pub fn normalize(path: &str) -> Result<NormPath, FsError> {
    let abs = absolute(path)?;
    let mut out = NormPath::new();
    for c in abs[1..].chars() {
        out.push(c.to_ascii_uppercase()).map_err(|_| FsError::PathTooLong)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_and_uppercases() {
        assert_eq!(normalize("/efi/carlos").unwrap(), "EFI/CARLOS");
        assert_eq!(normalize("\\\\EFI\\\\boot\\").unwrap(), "EFI/BOOT");
        assert_eq!(normalize("//a///b//").unwrap(), "A/B");
    }

    #[test]
    fn dots_resolve_without_escaping_root() {
        assert_eq!(normalize("/a/./b/../c").unwrap(), "A/C");
        assert_eq!(normalize("/../../x").unwrap(), "X");
        assert_eq!(normalize("/a/b/../..").unwrap(), "");
        assert_eq!(normalize("..").unwrap(), "");
    }

    #[test]
    fn root_forms_are_empty() {
        for p in ["", "/", ".", "\\", "/./"] {
            assert_eq!(normalize(p).unwrap(), "", "{p:?}");
        }
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        for p in ["/efi/boot/../carlos", "A\\b\\.\\C.TXT", "/", "x/../../y/z/", "/BIN/LS.ELF"] {
            let once = normalize(p).unwrap();
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn absolute_keeps_case() {
        assert_eq!(absolute("docs//Notes/..").unwrap(), "/docs");
        assert_eq!(absolute("").unwrap(), "/");
    }

    #[test]
    fn join_relative_and_absolute() {
        assert_eq!(join("/EFI", "BOOT").unwrap(), "/EFI/BOOT");
        assert_eq!(join("/EFI/BOOT", "..").unwrap(), "/EFI");
        assert_eq!(join("/EFI", "/BIN").unwrap(), "/BIN");
        assert_eq!(join("/", "a/b").unwrap(), "/a/b");
        assert_eq!(join("/EFI", "\\X").unwrap(), "/X");
    }

    #[test]
    fn overflow_is_reported() {
        let long = "abcdefg/".repeat(PATH_MAX / 8 + 1);
        assert_eq!(normalize(&long), Err(FsError::PathTooLong));
    }
}
