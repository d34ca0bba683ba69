//! Path-to-entry resolution, one component at a time.

use crate::block_dev::BlockDev;
use crate::dir::{DirCursor, DirRef};
use crate::entry::{Attr, DirEntry};
use crate::error::FsError;
use crate::name::{encode_8_3, is_separator};
use crate::volume::Volume;

/// What a path names: its first cluster, attributes and recorded size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub cluster: u16,
    pub attr:    Attr,
    pub size:    u32,
}

impl Resolved {
    /// The root pseudo-entry. It has no directory record of its own.
    pub const ROOT: Self = Self { cluster: 0, attr: Attr::DIRECTORY, size: 0 };

    pub fn is_dir(&self) -> bool {
        self.attr.contains(Attr::DIRECTORY)
    }

    /// Directory this entry opens into, or `NotADirectory`.
    pub fn as_dir(&self) -> Result<DirRef, FsError> {
        if !self.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(DirRef::from_cluster(self.cluster))
    }
}

impl From<DirEntry> for Resolved {
    fn from(e: DirEntry) -> Self {
        Self { cluster: e.cluster, attr: e.attr, size: e.size }
    }
}

/// Find `name` in `dir`. The raw 11-byte names compare with ASCII case
/// folded, so entries written in lowercase by other tools still match and
/// distinct high bytes never collide.
pub fn find_in_directory<D: BlockDev>(
    vol: &Volume,
    disk: &mut D,
    dir: DirRef,
    name: &[u8; 11],
) -> Result<DirEntry, FsError> {
    let mut cursor = DirCursor::begin(vol, dir)?;
    while let Some(entry) = cursor.next(vol, disk)? {
        if entry.name.eq_ignore_ascii_case(name) {
            return Ok(entry);
        }
    }
    Err(FsError::NotFound)
}

/// Resolve a `/`- or `\`-separated path from the root. Leading, trailing and
/// repeated separators are ignored; an empty path names the root.
pub fn resolve<D: BlockDev>(vol: &Volume, disk: &mut D, path: &str) -> Result<Resolved, FsError> {
    let mut current = Resolved::ROOT;
    for component in components(path) {
        let dir = current.as_dir()?;
        let name = encode_8_3(component)?;
        current = find_in_directory(vol, disk, dir, &name)?.into();
    }
    Ok(current)
}

pub(crate) fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(|c: char| c.is_ascii() && is_separator(c as u8)).filter(|c| !c.is_empty())
}

/// Split `path` into its parent path and final component. The parent is
/// empty for top-level names; `None` when the path has no component at all.
pub(crate) fn split_leaf(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.trim_start_matches(['/', '\\']).is_empty() {
        return None;
    }
    match trimmed.rfind(['/', '\\']) {
        Some(i) => Some((&trimmed[..i], &trimmed[i + 1..])),
        None => Some(("", trimmed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FAT16_EOC_MARK;
    use crate::testing::{ImageBuilder, MemDisk};

    fn root_with_readme() -> (MemDisk, Volume) {
        let mut disk = ImageBuilder::new().data_sectors(64).build();
        let vol = Volume::mount(&mut disk, 0).unwrap();
        disk.put_entry(vol.root_lba, 0, b"README  TXT", 0x20, 5, 42);
        (disk, vol)
    }

    #[test]
    fn finds_root_file_in_any_case() {
        let (mut disk, vol) = root_with_readme();
        let want = Resolved { cluster: 5, attr: Attr::ARCHIVE, size: 42 };
        assert_eq!(resolve(&vol, &mut disk, "/README.TXT").unwrap(), want);
        assert_eq!(resolve(&vol, &mut disk, "/readme.txt").unwrap(), want);
        assert_eq!(resolve(&vol, &mut disk, "README.TXT").unwrap(), want);
    }

    #[test]
    fn lowercase_on_disk_matches() {
        let (mut disk, vol) = root_with_readme();
        disk.put_entry(vol.root_lba, 1, b"notes   md ", 0x20, 6, 1);
        assert_eq!(resolve(&vol, &mut disk, "NOTES.MD").unwrap().cluster, 6);
    }

    #[test]
    fn empty_path_is_root() {
        let (mut disk, vol) = root_with_readme();
        for p in ["", "/", "//", "\\"] {
            assert_eq!(resolve(&vol, &mut disk, p).unwrap(), Resolved::ROOT);
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let (mut disk, vol) = root_with_readme();
        assert_eq!(resolve(&vol, &mut disk, "/NOPE.TXT"), Err(FsError::NotFound));
    }

    fn bin_tree(bin_attr: u8) -> (MemDisk, Volume) {
        let mut disk = ImageBuilder::new().data_sectors(64).build();
        let vol = Volume::mount(&mut disk, 0).unwrap();
        disk.put_entry(vol.root_lba, 0, b"BIN        ", bin_attr, 10, 0);
        disk.put_fat(&vol, 10, FAT16_EOC_MARK);
        let lba = vol.cluster_to_lba(10);
        disk.put_entry(lba, 0, b".          ", 0x10, 10, 0);
        disk.put_entry(lba, 1, b"..         ", 0x10, 0, 0);
        disk.put_entry(lba, 2, b"LS      ELF", 0x20, 20, 4096);
        (disk, vol)
    }

    #[test]
    fn descends_into_directories() {
        let (mut disk, vol) = bin_tree(0x10);
        let r = resolve(&vol, &mut disk, "/BIN/LS.ELF").unwrap();
        assert_eq!((r.cluster, r.size, r.is_dir()), (20, 4096, false));
        assert_eq!(resolve(&vol, &mut disk, "\\bin\\ls.elf").unwrap(), r);
        assert_eq!(resolve(&vol, &mut disk, "/BIN/").unwrap().cluster, 10);
    }

    #[test]
    fn file_as_intermediate_is_not_a_directory() {
        let (mut disk, vol) = bin_tree(0x20);
        assert_eq!(resolve(&vol, &mut disk, "/BIN/LS.ELF"), Err(FsError::NotADirectory));
    }

    #[test]
    fn dotdot_entry_leads_back_to_root() {
        let (mut disk, vol) = bin_tree(0x10);
        let up = find_in_directory(&vol, &mut disk, DirRef::Chain(10), b"..         ").unwrap();
        assert_eq!(DirRef::from_cluster(up.cluster), DirRef::Root);
    }

    #[test]
    fn high_bytes_do_not_collide() {
        let (mut disk, vol) = root_with_readme();
        disk.put_entry(vol.root_lba, 1, b"\x82          ", 0x10, 7, 0);
        disk.put_entry(vol.root_lba, 2, b"\x81          ", 0x10, 8, 0);
        let found = find_in_directory(&vol, &mut disk, DirRef::Root, b"\x81          ").unwrap();
        assert_eq!(found.cluster, 8);
        assert_eq!(find_in_directory(&vol, &mut disk, DirRef::Root, b"\x83          "), Err(FsError::NotFound));
    }

    #[test]
    fn non_ascii_path_is_rejected() {
        let (mut disk, vol) = root_with_readme();
        assert_eq!(resolve(&vol, &mut disk, "/é"), Err(FsError::BadComponent));
    }

    #[test]
    fn bad_components_surface() {
        let (mut disk, vol) = root_with_readme();
        assert_eq!(resolve(&vol, &mut disk, "/LONGFILENAME.TXT"), Err(FsError::NameTooLong));
        assert_eq!(resolve(&vol, &mut disk, "/A*B"), Err(FsError::BadComponent));
    }

    #[test]
    fn split_leaf_cases() {
        assert_eq!(split_leaf("/A/B/C"), Some(("/A/B", "C")));
        assert_eq!(split_leaf("NEW"), Some(("", "NEW")));
        assert_eq!(split_leaf("/NEW/"), Some(("", "NEW")));
        assert_eq!(split_leaf("A\\B"), Some(("A", "B")));
        assert_eq!(split_leaf("///"), None);
        assert_eq!(split_leaf(""), None);
    }

    #[test]
    fn resolves_fatfs_nested_file() {
        let mut disk = crate::testing::fatfs_image();
        crate::testing::with_fatfs(&mut disk, |fs| {
            use std::io::Write;
            let d = fs.root_dir().create_dir("DOCS").unwrap();
            let mut f = d.create_file("GUIDE.TXT").unwrap();
            f.write_all(b"hello").unwrap();
        });
        let vol = Volume::mount(&mut disk, 0).unwrap();
        let r = resolve(&vol, &mut disk, "/docs/guide.txt").unwrap();
        assert_eq!(r.size, 5);
        assert!(!r.is_dir());
        assert!(resolve(&vol, &mut disk, "/DOCS").unwrap().is_dir());
    }
}
