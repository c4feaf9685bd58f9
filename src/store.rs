// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// JSON state files shared between pipeline stages.
///
/// Every stage reads the array written by the previous one and writes its own
/// pretty-printed array. Failures here are the only ones allowed to end a run.
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{self, Error};

/// Reads a JSON array of records from `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be opened and
/// [`Error::Serialize`] when it does not contain an array of `T`.
pub fn load_records<T>(path: &Path) -> Result<Vec<T>, Error>
where
    T: DeserializeOwned
{
    let file = File::open(path).map_err(|source| error::io_error(path, source))?;
    let records: Vec<T> = serde_json::from_reader(BufReader::new(file))?;
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Reads a JSON array of records when the file exists, otherwise `None`.
///
/// # Errors
///
/// Same as [`load_records`] for a file that exists.
pub fn load_records_if_present<T>(path: &Path) -> Result<Option<Vec<T>>, Error>
where
    T: DeserializeOwned
{
    if !path.exists() {
        debug!("State file {} not present", path.display());
        return Ok(None);
    }
    load_records(path).map(Some)
}

/// Writes `records` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`Error::Write`] for filesystem failures and
/// [`Error::Serialize`] when a record cannot be encoded.
pub fn save_records<T>(path: &Path, records: &[T]) -> Result<(), Error>
where
    T: Serialize
{
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| error::write_error(parent, source))?;
    }

    let file = File::create(path).map_err(|source| error::write_error(path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer
        .write_all(b"\n")
        .map_err(|source| error::write_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::write_error(path, source))?;

    debug!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}
