// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Turning command-line choices into one immutable generation plan.

use crate::backend::dh;
use crate::config::Paths;
use crate::error::{Error, Result};
use crate::expiry::MAX_EXPIRY_DAYS;
use crate::host::HostIdentity;
use crate::san::{self, SanList};
use crate::template::{RenderedTemplate, Template};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The host's own certificate at the well-known location, plus DH
    /// parameters and the combined PEM
    Default,
    /// Certificate for the given names
    Custom,
    /// Certificate for each domain and its `*.` wildcard
    Wildcard,
    /// Only regenerate DH parameters and the combined PEM
    DhParamsOnly,
}

impl Mode {
    /// Pick the mode from flags: `--dh-params-only` beats `--default`, which
    /// beats `--wildcard`.
    pub fn from_flags(dh_params_only: bool, default: bool, wildcard: bool) -> Self {
        if dh_params_only {
            Mode::DhParamsOnly
        } else if default {
            Mode::Default
        } else if wildcard {
            Mode::Wildcard
        } else {
            Mode::Custom
        }
    }

    /// Modes that always write to the fixed well-known files.
    pub fn uses_fixed_paths(self) -> bool {
        matches!(self, Mode::Default | Mode::DhParamsOnly)
    }
}

/// Everything the user asked for, already parsed.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: Mode,
    pub names: Vec<String>,
    pub include_ip: bool,
    pub emit_csr: bool,
    pub force_overwrite: bool,
    pub expiry_days: u32,
    pub dh_bits: u32,
    pub template_path: PathBuf,
    pub output_override: Option<PathBuf>,
    /// File name stem for the fixed well-known artifacts
    pub cert_name: String,
}

/// Where each artifact goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub csr: Option<PathBuf>,
    pub dh_params: PathBuf,
    /// Certificate, key and DH parameters concatenated
    pub combined: Option<PathBuf>,
}

/// The resolved, validated description of one run.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub mode: Mode,
    pub paths: ArtifactPaths,
    /// Subject names; absent in DH-params-only mode
    pub san: Option<SanList>,
    pub rendered: Option<RenderedTemplate>,
    pub expiry_days: u32,
    pub dh_bits: u32,
    pub force_overwrite: bool,
    /// Artifacts live in the system certificate directories
    pub well_known: bool,
    pub issue_cert: bool,
    pub emit_csr: bool,
    pub generate_dh: bool,
    /// Non-fatal notices for the user
    pub advisories: Vec<String>,
}

/// Validate a request and decide every path and operation.
///
/// Nothing is written. The template is read unless the mode is
/// [`Mode::DhParamsOnly`].
pub fn resolve(
    request: &GenerationRequest,
    paths: &Paths,
    host: &dyn HostIdentity,
) -> Result<GenerationPlan> {
    let mut advisories = Vec::new();

    if !dh::is_supported(request.dh_bits) {
        return Err(Error::BadDhBits(request.dh_bits));
    }
    if request.dh_bits == dh::WEAK_BITS {
        advisories.push(format!(
            "{}-bit DH parameters are weak; use 2048 or more outside of testing",
            request.dh_bits
        ));
    }
    if request.expiry_days == 0 || request.expiry_days > MAX_EXPIRY_DAYS {
        return Err(Error::InvalidExpiry(format!("{}d", request.expiry_days)));
    }

    let mode = request.mode;
    if mode.uses_fixed_paths() {
        if let Some(out) = &request.output_override {
            advisories.push(format!(
                "--out {} is ignored; {} artifacts always go to {}",
                out.display(),
                if mode == Mode::Default {
                    "default"
                } else {
                    "DH-params-only"
                },
                paths.certs_dir.display()
            ));
        }
    }

    if mode == Mode::DhParamsOnly {
        if request.emit_csr {
            advisories.push("--csr has no effect with --dh-params-only".to_string());
        }
        return Ok(GenerationPlan {
            mode,
            paths: fixed_paths(paths, &request.cert_name, false)?,
            san: None,
            rendered: None,
            expiry_days: request.expiry_days,
            dh_bits: request.dh_bits,
            force_overwrite: request.force_overwrite,
            well_known: true,
            issue_cert: false,
            emit_csr: false,
            generate_dh: true,
            advisories,
        });
    }

    let san = san::build(mode, &request.names, request.include_ip, host)?;
    let template = Template::load(&request.template_path)?;
    log::debug!("using template {}", template.path().display());
    let rendered = template.render(&san);

    let (artifacts, well_known) = match (&request.output_override, mode) {
        (_, Mode::Default) => (
            fixed_paths(paths, &request.cert_name, request.emit_csr)?,
            true,
        ),
        (Some(out), _) => (override_paths(out, &san.common_name, paths, request.emit_csr)?, false),
        (None, _) => (
            derived_paths(paths, &san.common_name, request.emit_csr)?,
            true,
        ),
    };

    Ok(GenerationPlan {
        mode,
        paths: artifacts,
        san: Some(san),
        rendered: Some(rendered),
        expiry_days: request.expiry_days,
        dh_bits: request.dh_bits,
        force_overwrite: request.force_overwrite,
        well_known,
        issue_cert: true,
        emit_csr: request.emit_csr,
        generate_dh: mode == Mode::Default,
        advisories,
    })
}

/// The well-known certificate, key and combined PEM.
fn fixed_paths(paths: &Paths, cert_name: &str, emit_csr: bool) -> Result<ArtifactPaths> {
    Ok(ArtifactPaths {
        cert: paths.cert_path(cert_name)?,
        key: paths.key_path(cert_name)?,
        csr: if emit_csr {
            Some(paths.csr_path(cert_name)?)
        } else {
            None
        },
        dh_params: paths.dh_params.clone(),
        combined: Some(paths.combined_path(cert_name)?),
    })
}

/// Paths named after the common name in the system directories.
fn derived_paths(paths: &Paths, common_name: &str, emit_csr: bool) -> Result<ArtifactPaths> {
    Ok(ArtifactPaths {
        cert: paths.cert_path(common_name)?,
        key: paths.key_path(common_name)?,
        csr: if emit_csr {
            Some(paths.csr_path(common_name)?)
        } else {
            None
        },
        dh_params: paths.dh_params.clone(),
        combined: None,
    })
}

/// Paths next to an explicit `--out` location.
///
/// An existing directory receives `<common name>.crt`. Otherwise the file
/// keeps a `.crt` or `.pem` extension and gets `.crt` appended for anything
/// else; key and CSR replace that extension.
fn override_paths(
    out: &Path,
    common_name: &str,
    paths: &Paths,
    emit_csr: bool,
) -> Result<ArtifactPaths> {
    let cert = if out.is_dir() {
        let file = paths.cert_path(common_name)?;
        match file.file_name() {
            Some(name) => out.join(name),
            None => return Err(Error::InvalidPath(out.to_path_buf())),
        }
    } else {
        normalize_cert_extension(out)
    };

    if cert.file_stem().is_none() {
        return Err(Error::InvalidPath(out.to_path_buf()));
    }

    Ok(ArtifactPaths {
        key: cert.with_extension("key"),
        csr: emit_csr.then(|| cert.with_extension("csr")),
        cert,
        dh_params: paths.dh_params.clone(),
        combined: None,
    })
}

fn normalize_cert_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("crt") | Some("pem") => path.to_path_buf(),
        _ => {
            let mut name = OsString::from(path.as_os_str());
            name.push(".crt");
            PathBuf::from(name)
        }
    }
}
