// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid expiry '{0}': expected a positive number followed by y, m or d (at most 10957 days)")]
    InvalidExpiry(String),

    #[error("Bad template {path}: {reason}")]
    BadTemplate { path: PathBuf, reason: String },

    #[error("Invalid DH parameter size {0}: must be one of 1024, 2048, 4096")]
    BadDhBits(u32),

    #[error("{0} already exists. Use --force to overwrite.")]
    WouldOverwrite(PathBuf),

    #[error("{0} is missing. Generate a certificate first; the combined PEM cannot be rebuilt without it.")]
    MissingPrerequisite(PathBuf),

    #[error("Crypto backend failed:\n{0}")]
    Backend(String),

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Writing to {0} requires root privileges.\nRun with sudo, or use --out to write elsewhere.")]
    NotPrivileged(PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to set permissions on {path}: {source}")]
    SetPermissions {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid path (non-UTF8): {0}")]
    InvalidPath(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command '{command}' not found.\n{hint}")]
    CommandNotFound { command: String, hint: String },

    #[error("Command '{command}' timed out after {seconds} seconds")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Command failed: {command}\n{stderr}")]
    Command { command: String, stderr: String },

    #[error("Trust store error: {0}")]
    TrustStore(String),

    #[error("Failed to install signal handling: {0}")]
    Signal(String),

    #[error("Failed to parse certificate: {0}")]
    CertParse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
