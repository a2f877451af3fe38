//! Shared helpers: the rayon thread pool, content hashing and atomic file
//! writes used by both genome index and methylome persistence.

use std::io::{
    BufWriter,
    Write,
};
use std::path::Path;

use once_cell::sync::Lazy;
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
};
use serde::Serialize;
use tempfile::NamedTempFile;
use xxhash_rust::xxh64::xxh64;

use crate::error::{
    MethdexError,
    Result,
};

pub static THREAD_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    let num_threads: Option<usize> = std::env::var("METHDEX_NUM_THREADS")
        .ok()
        .and_then(|str| str.parse::<usize>().ok());
    ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .expect("Failed to create thread pool")
});

pub fn n_threads() -> usize {
    THREAD_POOL.current_num_threads()
}

/// Stable 64-bit content hash of any serializable value.
///
/// Used to stamp genome indexes and methylomes so that consistency between
/// the two can be verified without comparing full arrays.
pub(crate) fn content_hash<T: Serialize>(value: &T) -> Result<u64> {
    let bytes = bincode::serialize(value)?;
    Ok(xxh64(&bytes, 0))
}

/// Writes a file atomically: the payload goes to a temporary file in the
/// target directory which is then renamed over `path`. A crash mid-write
/// never leaves a partial file under the final name.
pub(crate) fn atomic_write<F>(
    path: &Path,
    write_fn: F,
) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut std::fs::File>) -> Result<()>, {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_fn(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| MethdexError::Io(e.error))?;
    Ok(())
}

/// Checks a genome or methylome name against the catalogue naming
/// convention.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
