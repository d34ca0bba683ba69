//! 8.3 short-name encoding.

use crate::error::FsError;

pub fn is_separator(c: u8) -> bool {
    c == b'/' || c == b'\\'
}

/// Characters a short name may not carry (besides controls and non-ASCII).
const FORBIDDEN: &[u8] = b"\"*+,:;<=>?[]| ";

/// Encode one path component (`"kernel.elf"`) into its padded, uppercase
/// 11-byte on-disk form (`"KERNEL  ELF"`).
pub fn encode_8_3(component: &str) -> Result<[u8; 11], FsError> {
    let bytes = component.as_bytes();
    let mut out = [b' '; 11];

    let (stem, ext) = match bytes.iter().position(|&b| b == b'.') {
        Some(i) => (&bytes[..i], Some(&bytes[i + 1..])),
        None => (bytes, None),
    };

    if stem.is_empty() {
        return Err(FsError::BadComponent);
    }
    if stem.len() > 8 {
        return Err(FsError::NameTooLong);
    }
    copy_upper(stem, &mut out[..8])?;

    if let Some(ext) = ext {
        if ext.len() > 3 {
            return Err(FsError::NameTooLong);
        }
        copy_upper(ext, &mut out[8..])?;
    }
    Ok(out)
}

fn copy_upper(src: &[u8], dst: &mut [u8]) -> Result<(), FsError> {
    for (d, &c) in dst.iter_mut().zip(src) {
        if c < 0x20 || c >= 0x7F || c == b'.' || is_separator(c) || FORBIDDEN.contains(&c) {
            return Err(FsError::BadComponent);
        }
        *d = c.to_ascii_uppercase();
    }
    Ok(())
}
