//! Ledger file persistence
//!
//! Whole-file reads and writes of the binary ledger image. Saves go to a
//! sibling temporary file that is renamed over the target, so an existing
//! ledger is never left half-written.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::codec::{decode_chain, encode_chain, CodecError};
use super::Chain;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No existing blockchain found at {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("could not read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not open {} for writing: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid ledger: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// Write the chain to `path`, replacing any existing file atomically
pub fn save_chain<P: AsRef<Path>>(chain: &Chain, path: P) -> Result<(), StorageError> {
    let path = path.as_ref();
    let bytes = encode_chain(chain);
    let tmp = temp_path(path);

    let write_error = |source| StorageError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let result = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(write_error(source));
    }

    info!(path = %path.display(), blocks = chain.len(), bytes = bytes.len(), "ledger saved");
    Ok(())
}

/// Read and decode the chain stored at `path`
pub fn load_chain<P: AsRef<Path>>(path: P) -> Result<Chain, StorageError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::FileNotFound(path.to_path_buf())
        } else {
            StorageError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let chain = decode_chain(&bytes).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), blocks = chain.len(), "ledger loaded");
    Ok(chain)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(".tmp");
    path.with_file_name(name)
}
