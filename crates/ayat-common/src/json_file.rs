//! Durable JSON file helpers
//!
//! Every artifact the ingester produces is a single pretty-printed JSON
//! document. Writes go to a sibling temp file which is then renamed over the
//! target, so readers only ever observe the previous or the new contents.

use crate::error::{AyatError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Read and decode a JSON file.
///
/// Returns `Ok(None)` when the file does not exist. A file that exists but
/// does not decode yields [`AyatError::Parse`].
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Option<T>> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| AyatError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize `value` as pretty-printed JSON and atomically replace `path`.
///
/// Parent directories are created as needed.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = sibling_with_suffix(path, ".tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// `all_ayahs.json` + `.corrupt` -> `all_ayahs.json.corrupt`
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
