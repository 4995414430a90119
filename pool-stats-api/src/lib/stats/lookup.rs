//! Case-insensitive lookup of directory entries.

use std::path::Path;

use tokio::fs;

/// Find the first directory entry whose name matches `wanted`
/// ASCII-case-insensitively, returning it in its on-disk spelling.
///
/// An unreadable directory is treated the same as no match. With several
/// case variants present, the first one in directory order wins; that
/// order is filesystem-defined.
pub async fn find_entry_ignore_case(dir: &Path, wanted: &str) -> Option<String> {
    let mut entries = fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Some(name) = entry.file_name().to_str() {
            if name.eq_ignore_ascii_case(wanted) {
                return Some(name.to_string());
            }
        }
    }
    None
}
