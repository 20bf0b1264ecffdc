// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Interrupt handling and cleanup of temporary working files.
//!
//! SIGINT and SIGTERM are blocked on the calling thread (and so on every
//! thread spawned after it) and consumed by a dedicated thread through
//! `sigwait`. Either signal removes every registered temporary path; SIGINT
//! then exits with status 1, SIGTERM with status 0.

use crate::error::{Error, Result};
use nix::sys::signal::{SigSet, Signal};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Paths to remove when the process is interrupted.
#[derive(Debug, Default)]
pub struct TempRegistry {
    paths: Mutex<Vec<PathBuf>>,
}

impl TempRegistry {
    pub fn register(&self, path: &Path) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.to_path_buf());
        }
    }

    pub fn unregister(&self, path: &Path) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.retain(|p| p != path);
        }
    }

    /// Remove every registered path. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let paths = match self.paths.lock() {
            Ok(mut paths) => std::mem::take(&mut *paths),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        let mut removed = 0;
        for path in paths {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}

static TEMP_PATHS: Lazy<TempRegistry> = Lazy::new(TempRegistry::default);

/// Track a temporary file or directory that must not outlive an interrupt.
pub fn register_temp_path(path: &Path) {
    TEMP_PATHS.register(path);
}

pub fn unregister_temp_path(path: &Path) {
    TEMP_PATHS.unregister(path);
}

/// Exit status for a terminating signal.
fn exit_code(signal: Signal) -> i32 {
    match signal {
        Signal::SIGTERM => 0,
        _ => 1,
    }
}

/// Block SIGINT/SIGTERM and start the thread that handles them.
///
/// Must run before any other thread is spawned so the mask is inherited.
pub fn install() -> Result<()> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.thread_block()
        .map_err(|e| Error::Signal(e.to_string()))?;

    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || loop {
            match mask.wait() {
                Ok(signal) => {
                    log::debug!("received {:?}", signal);
                    let removed = TEMP_PATHS.cleanup();
                    log::debug!("removed {} temporary path(s)", removed);
                    std::process::exit(exit_code(signal));
                }
                Err(e) => {
                    log::error!("sigwait failed: {}", e);
                    return;
                }
            }
        })
        .map_err(|e| Error::Signal(e.to_string()))?;

    Ok(())
}
