// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use super::{dh, BackendFailure, BackendResult, CryptoBackend, IssuedCertificate};
use crate::command::run_command_with_timeout;
use crate::fs::{path_to_str, write_secret_file};
use crate::signals;
use crate::template::RenderedTemplate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Upper bound for a single openssl invocation.
const OPENSSL_TIMEOUT_SECS: u64 = 120;

/// Backend that drives the `openssl` command-line tool.
///
/// Every operation runs in a private temporary directory holding the rendered
/// template and the tool's output files. The directory is registered for
/// removal on SIGINT/SIGTERM and deleted when the operation returns.
pub struct OpensslBackend {
    program: String,
    timeout_secs: u64,
}

impl Default for OpensslBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OpensslBackend {
    pub fn new() -> Self {
        Self::with_program("openssl")
    }

    /// Use a specific executable instead of `openssl` from `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout_secs: OPENSSL_TIMEOUT_SECS,
        }
    }

    fn run(&self, args: &[&str]) -> BackendResult<()> {
        let output = run_command_with_timeout(&self.program, args, self.timeout_secs)
            .map_err(|e| BackendFailure(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(BackendFailure(format!(
                "{} {} exited with {}",
                self.program,
                args.first().copied().unwrap_or_default(),
                output.status
            )))
        } else {
            Err(BackendFailure(stderr))
        }
    }
}

/// Scratch directory for one backend operation.
struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    fn new() -> BackendResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("localcert-")
            .tempdir()
            .map_err(|e| BackendFailure(format!("cannot create working directory: {}", e)))?;
        signals::register_temp_path(dir.path());
        Ok(Self { dir })
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> BackendResult<PathBuf> {
        let path = self.file(name);
        write_secret_file(&path, contents.as_bytes()).map_err(|e| BackendFailure(e.to_string()))?;
        Ok(path)
    }

    fn read(&self, name: &str) -> BackendResult<String> {
        let path = self.file(name);
        std::fs::read_to_string(&path).map_err(|e| {
            BackendFailure(format!("openssl produced no {}: {}", path.display(), e))
        })
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        signals::unregister_temp_path(self.dir.path());
    }
}

fn arg(path: &Path) -> BackendResult<&str> {
    path_to_str(path).map_err(|e| BackendFailure(e.to_string()))
}

impl CryptoBackend for OpensslBackend {
    fn issue_certificate(
        &self,
        template: &RenderedTemplate,
        days: u32,
    ) -> BackendResult<IssuedCertificate> {
        let work = WorkDir::new()?;
        let config = work.write("req.cnf", template.text())?;
        let key = work.file("key.pem");
        let cert = work.file("cert.pem");
        let days = days.to_string();

        self.run(&[
            "req",
            "-config",
            arg(&config)?,
            "-new",
            "-x509",
            "-sha256",
            "-days",
            &days,
            "-nodes",
            "-keyout",
            arg(&key)?,
            "-out",
            arg(&cert)?,
        ])?;

        Ok(IssuedCertificate {
            cert_pem: work.read("cert.pem")?,
            key_pem: work.read("key.pem")?,
        })
    }

    fn issue_csr(&self, template: &RenderedTemplate, key_pem: &str) -> BackendResult<String> {
        let work = WorkDir::new()?;
        let config = work.write("req.cnf", template.text())?;
        let key = work.write("key.pem", key_pem)?;
        let csr = work.file("req.csr");

        self.run(&[
            "req",
            "-config",
            arg(&config)?,
            "-new",
            "-sha256",
            "-key",
            arg(&key)?,
            "-out",
            arg(&csr)?,
        ])?;

        work.read("req.csr")
    }

    fn generate_dh_params(&self, bits: u32) -> BackendResult<String> {
        let group = dh::group(bits)
            .ok_or_else(|| BackendFailure(format!("no named DH group of {} bits", bits)))?;

        // openssl only knows the RFC 7919 groups by name
        let Some(name) = group.openssl_group else {
            log::debug!("using built-in {} parameters", group.name);
            return Ok(group.pem.to_string());
        };

        let work = WorkDir::new()?;
        let out = work.file("dhparams.pem");
        let pkeyopt = format!("group:{}", name);
        self.run(&[
            "genpkey",
            "-genparam",
            "-algorithm",
            "DH",
            "-pkeyopt",
            &pkeyopt,
            "-out",
            arg(&out)?,
        ])?;

        work.read("dhparams.pem")
    }

    fn name(&self) -> &'static str {
        "openssl"
    }
}
