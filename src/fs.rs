// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::signals;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

pub fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomically write a file that starts out readable by the owner only.
///
/// The data goes to a temporary file in the same directory which is then
/// renamed over `path`. An existing read-only target is replaced rather than
/// opened for writing. The temporary file is registered for removal if the
/// process is interrupted before the rename.
pub fn atomic_write_secret(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
    let random_suffix: u64 = rand::Rng::random(&mut rand::rng());
    let temp_path = parent.join(format!(".tmp-{:x}", random_suffix));

    signals::register_temp_path(&temp_path);
    let result = write_secret_file(&temp_path, contents).and_then(|()| {
        std::fs::rename(&temp_path, path).map_err(|e| Error::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    });
    if result.is_err() && temp_path.exists() {
        let _ = std::fs::remove_file(&temp_path);
    }
    signals::unregister_temp_path(&temp_path);

    result
}

/// Create (or truncate) a file with mode 0600 and flush it to disk.
pub fn write_secret_file(path: &Path, contents: &[u8]) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let write_err = |e| Error::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(write_err)?;

    file.write_all(contents).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    Ok(())
}

pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        Error::SetPermissions {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
