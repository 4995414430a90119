//! Aggregation of pool engine status files into JSON response bodies.
//!
//! The pool engine owns the files under the stats directory; this module
//! only ever reads them. File sizes are checked before reading and every
//! read is capped at the checked size, so a file that grows mid-request
//! cannot blow up a response.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{
    fs::{self, File},
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
};
use tracing::{debug, warn};

use crate::{
    error::StatsError,
    stats::{
        buffer::{ResponseBuffer, POOL_SNAPSHOT_CAPACITY, USER_AGGREGATE_CAPACITY},
        lookup::find_entry_ignore_case,
    },
};

/// Largest user file the API will serve or aggregate.
pub const MAX_USER_FILE_SIZE: u64 = 64 * 1024;

/// Records served from the head of `pool.status`.
const POOL_STATUS_RECORDS: usize = 3;

/// Read-only view over the stats directory written by the pool engine.
#[derive(Debug, Clone)]
pub struct StatsReader {
    stats_dir: PathBuf,
}

impl StatsReader {
    pub fn new(stats_dir: impl Into<PathBuf>) -> Self {
        Self {
            stats_dir: stats_dir.into(),
        }
    }

    fn pool_status_path(&self) -> PathBuf {
        self.stats_dir.join("pool").join("pool.status")
    }

    fn users_dir(&self) -> PathBuf {
        self.stats_dir.join("users")
    }

    /// Read the first records of `pool.status` as a JSON array.
    ///
    /// Each line is assumed to hold one JSON value and is copied verbatim,
    /// minus the line terminator.
    pub async fn pool_status(&self) -> Result<Vec<u8>, StatsError> {
        let file = File::open(self.pool_status_path()).await?;
        let mut records = BufReader::new(file).split(b'\n');

        let mut buffer = ResponseBuffer::with_capacity(POOL_SNAPSHOT_CAPACITY);
        buffer.append(b"[")?;
        let mut count = 0;
        while count < POOL_STATUS_RECORDS {
            match records.next_segment().await {
                Ok(Some(record)) => {
                    if count > 0 {
                        buffer.append(b",")?;
                    }
                    buffer.append(&record)?;
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Pool status read ended early: {e}");
                    break;
                }
            }
        }
        buffer.append(b"]")?;
        Ok(buffer.into_bytes())
    }

    /// Read one user's stats file, matching the address case-insensitively.
    ///
    /// The body is the file content verbatim.
    pub async fn user(&self, address: &str) -> Result<Vec<u8>, StatsError> {
        let users_dir = self.users_dir();
        let filename = find_entry_ignore_case(&users_dir, address)
            .await
            .ok_or_else(|| StatsError::UserNotFound {
                address: address.to_string(),
            })?;
        let path = users_dir.join(&filename);

        // A file that vanishes after the directory scan is reported the
        // same as one that never existed.
        let size = match fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(_) => {
                return Err(StatsError::UserNotFound {
                    address: address.to_string(),
                })
            }
        };
        if size > MAX_USER_FILE_SIZE {
            warn!("User file {} is too large: {size} bytes", path.display());
            return Err(StatsError::UserFileTooLarge {
                address: address.to_string(),
                size,
            });
        }

        // The size is not re-checked; a file that grows between the stat
        // and the read is truncated at the stat size.
        read_capped(&path, size).await.map_err(StatsError::Io)
    }

    /// Aggregate every visible user file into one JSON object keyed by
    /// file name.
    ///
    /// Hidden files, oversized files, and files that cannot be statted or
    /// read are skipped; the entry order is directory order.
    pub async fn all_users(&self) -> Result<Vec<u8>, StatsError> {
        let mut entries = fs::read_dir(self.users_dir()).await?;

        let mut buffer = ResponseBuffer::with_capacity(USER_AGGREGATE_CAPACITY);
        buffer.append(b"{")?;
        let mut users_seen = 0usize;
        let mut first = true;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Users directory listing ended early: {e}");
                    break;
                }
            };
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!("Skipping user file with non-UTF-8 name: {file_name:?}");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            users_seen += 1;

            let size = match entry.metadata().await {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Cannot stat user file {name}: {e}");
                    continue;
                }
            };
            if size > MAX_USER_FILE_SIZE {
                warn!("Skipping oversized user file: {name} ({size} bytes)");
                continue;
            }
            let contents = match read_capped(&entry.path(), size).await {
                Ok(contents) => contents,
                // Deleted between the listing and the open; nothing to report.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Cannot read user file {name}: {e}");
                    continue;
                }
            };

            if !first {
                buffer.append(b",")?;
            }
            buffer.append(b"\"")?;
            buffer.append(name.as_bytes())?;
            buffer.append(b"\":")?;
            buffer.append(&contents)?;
            first = false;
        }
        buffer.append(b"}")?;

        debug!(
            "Aggregated {users_seen} users, response size: {} bytes",
            buffer.len()
        );
        Ok(buffer.into_bytes())
    }
}

/// Read at most `limit` bytes from `path`.
async fn read_capped(path: &Path, limit: u64) -> std::io::Result<Vec<u8>> {
    let file = File::open(path).await?;
    let mut contents = Vec::with_capacity(limit as usize);
    file.take(limit).read_to_end(&mut contents).await?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats_root() -> TempDir {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("pool")).unwrap();
        std::fs::create_dir_all(root.path().join("users")).unwrap();
        root
    }

    fn write_pool_status(root: &TempDir, contents: &str) {
        std::fs::write(root.path().join("pool").join("pool.status"), contents).unwrap();
    }

    fn write_user(root: &TempDir, name: &str, contents: &[u8]) {
        std::fs::write(root.path().join("users").join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn pool_status_wraps_records_in_an_array() {
        let root = stats_root();
        write_pool_status(&root, "{\"hashrate1m\":\"1.2T\"}\n{\"users\":3}\n");
        let body = StatsReader::new(root.path()).pool_status().await.unwrap();
        assert_eq!(body, b"[{\"hashrate1m\":\"1.2T\"},{\"users\":3}]".to_vec());
    }

    #[tokio::test]
    async fn pool_status_serves_at_most_three_records() {
        let root = stats_root();
        write_pool_status(&root, "1\n2\n3\n4\n5\n");
        let body = StatsReader::new(root.path()).pool_status().await.unwrap();
        assert_eq!(body, b"[1,2,3]".to_vec());
    }

    #[tokio::test]
    async fn pool_status_without_trailing_newline_keeps_last_record() {
        let root = stats_root();
        write_pool_status(&root, "1\n2");
        let body = StatsReader::new(root.path()).pool_status().await.unwrap();
        assert_eq!(body, b"[1,2]".to_vec());
    }

    #[tokio::test]
    async fn empty_pool_status_yields_an_empty_array() {
        let root = stats_root();
        write_pool_status(&root, "");
        let body = StatsReader::new(root.path()).pool_status().await.unwrap();
        assert_eq!(body, b"[]".to_vec());
    }

    #[tokio::test]
    async fn missing_pool_status_is_an_io_error() {
        let root = stats_root();
        let err = StatsReader::new(root.path()).pool_status().await.unwrap_err();
        assert!(matches!(err, StatsError::Io(_)));
    }

    #[tokio::test]
    async fn user_body_is_the_file_content_verbatim() {
        let root = stats_root();
        write_user(&root, "xyz", b"{\"hashrate\":5}");
        let body = StatsReader::new(root.path()).user("XYZ").await.unwrap();
        assert_eq!(body, b"{\"hashrate\":5}".to_vec());
    }

    #[tokio::test]
    async fn unknown_user_reports_the_requested_address() {
        let root = stats_root();
        write_user(&root, "abc123", b"{}");
        let err = StatsReader::new(root.path()).user("ghost").await.unwrap_err();
        match err {
            StatsError::UserNotFound { address } => assert_eq!(address, "ghost"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn user_file_at_the_size_limit_is_served_whole() {
        let root = stats_root();
        let contents = vec![b'x'; MAX_USER_FILE_SIZE as usize];
        write_user(&root, "edge", &contents);
        let body = StatsReader::new(root.path()).user("edge").await.unwrap();
        assert_eq!(body, contents);
    }

    #[tokio::test]
    async fn user_file_one_byte_over_the_limit_reports_its_size() {
        let root = stats_root();
        write_user(&root, "big", &vec![b'x'; MAX_USER_FILE_SIZE as usize + 1]);
        let err = StatsReader::new(root.path()).user("big").await.unwrap_err();
        match err {
            StatsError::UserFileTooLarge { address, size } => {
                assert_eq!(address, "big");
                assert_eq!(size, MAX_USER_FILE_SIZE + 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn all_users_joins_files_into_one_object() {
        let root = stats_root();
        write_user(&root, "alice", b"{\"hashrate\":1}");
        write_user(&root, "bob", b"{\"hashrate\":2}");
        let body = StatsReader::new(root.path()).all_users().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["alice"]["hashrate"], 1);
        assert_eq!(value["bob"]["hashrate"], 2);
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_users_skips_hidden_and_oversized_files() {
        let root = stats_root();
        let small = format!("{{\"pad\":\"{}\"}}", "x".repeat(1000));
        write_user(&root, "a", small.as_bytes());
        write_user(&root, "b", &vec![b'x'; 70 * 1024]);
        write_user(&root, ".hidden", b"{\"secret\":true}");
        let body = StatsReader::new(root.path()).all_users().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("a"));
    }

    #[tokio::test]
    async fn all_users_skips_entries_that_cannot_be_read() {
        let root = stats_root();
        write_user(&root, "a", b"{\"hashrate\":1}");
        std::fs::create_dir(root.path().join("users").join("nested")).unwrap();
        let body = StatsReader::new(root.path()).all_users().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("a"));
    }

    #[tokio::test]
    async fn empty_users_directory_yields_an_empty_object() {
        let root = stats_root();
        let body = StatsReader::new(root.path()).all_users().await.unwrap();
        assert_eq!(body, b"{}".to_vec());
    }

    #[tokio::test]
    async fn missing_users_directory_is_an_io_error() {
        let root = TempDir::new().unwrap();
        let err = StatsReader::new(root.path()).all_users().await.unwrap_err();
        assert!(matches!(err, StatsError::Io(_)));
    }

    #[tokio::test]
    async fn aggregate_past_the_response_cap_is_rejected() {
        let root = stats_root();
        let contents = vec![b'x'; MAX_USER_FILE_SIZE as usize];
        for i in 0..161 {
            write_user(&root, &format!("user{i:03}"), &contents);
        }
        let err = StatsReader::new(root.path()).all_users().await.unwrap_err();
        assert!(matches!(err, StatsError::ResponseTooLarge));
    }
}
