use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::BINARY_SNIFF_BYTES;

/// Returns true when the file should be excluded from textual comparison.
///
/// A file is binary when its first 8 KiB contain a null byte. Files that cannot
/// be read are treated as binary as well.
pub fn is_binary(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return true;
    };

    let mut head = Vec::with_capacity(BINARY_SNIFF_BYTES as usize);
    match file.take(BINARY_SNIFF_BYTES).read_to_end(&mut head) {
        Ok(_) => head.contains(&0),
        Err(_) => true,
    }
}
