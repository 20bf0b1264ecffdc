// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::backend::{dh, BackendKind};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Current config file version. Increment when making breaking changes.
const CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides the default DH parameter size.
pub const DH_BITS_ENV: &str = "LOCALCERT_DH_BITS";

/// Environment variable that relocates every well-known path under a prefix.
pub const ROOT_ENV: &str = "LOCALCERT_ROOT";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Config file version for future migration support
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    /// Validity period used when --expiry is not given
    #[serde(default = "default_expiry")]
    pub expiry: String,
    #[serde(default = "default_dh_bits")]
    pub dh_bits: u32,
    /// Template path; defaults to the packaged template under the root
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub backend: BackendKind,
    /// File name stem of the default certificate, key and combined PEM
    #[serde(default = "default_cert_name")]
    pub cert_name: String,
}

fn default_config_version() -> u32 {
    CONFIG_VERSION
}

fn default_expiry() -> String {
    "10y".to_string()
}

fn default_dh_bits() -> u32 {
    2048
}

fn default_cert_name() -> String {
    "ssl-cert-local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            expiry: default_expiry(),
            dh_bits: default_dh_bits(),
            template: None,
            backend: BackendKind::default(),
            cert_name: default_cert_name(),
        }
    }
}

/// Well-known locations, all relative to a filesystem root.
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
    /// True when the root is the real `/`, i.e. no prefix override is active
    pub system: bool,
    pub certs_dir: PathBuf,
    pub private_dir: PathBuf,
    pub config: PathBuf,
    pub template: PathBuf,
    pub dh_params: PathBuf,
}

impl Paths {
    /// Paths under `/`, or under `$LOCALCERT_ROOT` when set.
    pub fn new() -> Result<Self> {
        match std::env::var(ROOT_ENV) {
            Ok(custom_root) if !custom_root.is_empty() => {
                let path = PathBuf::from(&custom_root);
                if !path.is_absolute() {
                    return Err(Error::Config(format!(
                        "{} must be an absolute path, got: {}",
                        ROOT_ENV, custom_root
                    )));
                }
                Ok(Self::with_root(&path))
            }
            _ => Ok(Self::with_root(Path::new("/"))),
        }
    }

    pub fn with_root(root: &Path) -> Self {
        let private_dir = root.join("etc/ssl/private");
        Self {
            root: root.to_path_buf(),
            system: root == Path::new("/"),
            certs_dir: root.join("etc/ssl/certs"),
            config: root.join("etc/localcert/localcert.toml"),
            template: root.join("usr/share/localcert/localcert.cnf"),
            dh_params: private_dir.join("dhparams.pem"),
            private_dir,
        }
    }

    /// Sanitize a name for safe use in file paths.
    /// Wildcards (e.g., `*.example.com`) are supported by replacing `*` with `_wildcard_`.
    fn sanitize_name_for_filename(name: &str) -> Result<String> {
        let invalid = |reason: &str| Error::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if name.contains("..") {
            return Err(invalid("name contains path traversal sequence"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(invalid("name contains path separator"));
        }
        if name.starts_with('.') || name.ends_with('.') {
            return Err(invalid("name cannot start or end with a dot"));
        }

        let sanitized = name.replace('*', "_wildcard_");

        // Only allow alphanumeric, dots, hyphens, underscores
        if let Some(c) = sanitized
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-' && *c != '_')
        {
            return Err(invalid(&format!("contains invalid character: '{}'", c)));
        }

        Ok(sanitized)
    }

    pub fn cert_path(&self, name: &str) -> Result<PathBuf> {
        let safe = Self::sanitize_name_for_filename(name)?;
        Ok(self.certs_dir.join(format!("{}.crt", safe)))
    }

    pub fn key_path(&self, name: &str) -> Result<PathBuf> {
        let safe = Self::sanitize_name_for_filename(name)?;
        Ok(self.private_dir.join(format!("{}.key", safe)))
    }

    pub fn csr_path(&self, name: &str) -> Result<PathBuf> {
        let safe = Self::sanitize_name_for_filename(name)?;
        Ok(self.certs_dir.join(format!("{}.csr", safe)))
    }

    /// Certificate, key and DH parameters concatenated.
    pub fn combined_path(&self, name: &str) -> Result<PathBuf> {
        let safe = Self::sanitize_name_for_filename(name)?;
        Ok(self.private_dir.join(format!("{}.pem", safe)))
    }
}

impl Config {
    /// Load a config file the user named explicitly. Unlike [`Config::load`],
    /// a missing file is an error.
    pub fn load_required(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ReadFile {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such config file"),
            });
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
                path: path.to_path_buf(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
        } else {
            log::debug!("{} not found, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.config_version > CONFIG_VERSION {
            eprintln!(
                "Warning: localcert.toml version {} is newer than supported version {}.",
                self.config_version, CONFIG_VERSION
            );
        }

        crate::expiry::resolve(&self.expiry)
            .map_err(|e| Error::Config(format!("expiry: {}", e)))?;

        if !dh::is_supported(self.dh_bits) {
            return Err(Error::Config(format!(
                "dh_bits must be one of {:?}, got {}",
                dh::SUPPORTED_BITS,
                self.dh_bits
            )));
        }

        Paths::sanitize_name_for_filename(&self.cert_name)
            .map_err(|e| Error::Config(format!("cert_name: {}", e)))?;

        Ok(())
    }

    /// Template path from the config, or the packaged default.
    pub fn template_path(&self, paths: &Paths) -> PathBuf {
        self.template
            .clone()
            .unwrap_or_else(|| paths.template.clone())
    }

    /// DH size with precedence: explicit flag, then `$LOCALCERT_DH_BITS`, then config.
    pub fn effective_dh_bits(&self, flag: Option<u32>) -> Result<u32> {
        if let Some(bits) = flag {
            return Ok(bits);
        }
        match std::env::var(DH_BITS_ENV) {
            Ok(value) if !value.trim().is_empty() => value.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a number, got: {}", DH_BITS_ENV, value))
            }),
            _ => Ok(self.dh_bits),
        }
    }
}
