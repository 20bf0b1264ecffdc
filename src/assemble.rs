// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Writing artifacts, restricting their permissions and building the
//! combined PEM.

use crate::backend::IssuedCertificate;
use crate::error::{Error, Result};
use crate::fs::{atomic_write_secret, ensure_dir, read_to_string, set_mode};
use crate::plan::GenerationPlan;
use crate::trust::TrustStore;
use std::path::Path;

pub const KEY_MODE: u32 = 0o400;
pub const CERT_MODE: u32 = 0o644;
pub const CSR_MODE: u32 = 0o600;
pub const DH_PARAMS_MODE: u32 = 0o400;
pub const COMBINED_MODE: u32 = 0o400;

/// Write `contents` through a 0600 temp file, then apply the final `mode`.
fn write_artifact(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
    if !parent.as_os_str().is_empty() {
        ensure_dir(parent)?;
    }
    atomic_write_secret(path, contents.as_bytes())?;
    set_mode(path, mode)?;
    log::info!("wrote {} ({:o})", path.display(), mode);
    Ok(())
}

pub fn store_certificate(plan: &GenerationPlan, issued: &IssuedCertificate) -> Result<()> {
    // Key first: a certificate without its key is useless
    write_artifact(&plan.paths.key, &issued.key_pem, KEY_MODE)?;
    write_artifact(&plan.paths.cert, &issued.cert_pem, CERT_MODE)
}

pub fn store_csr(plan: &GenerationPlan, csr_pem: &str) -> Result<()> {
    match &plan.paths.csr {
        Some(path) => write_artifact(path, csr_pem, CSR_MODE),
        None => Ok(()),
    }
}

pub fn store_dh_params(plan: &GenerationPlan, pem: &str) -> Result<()> {
    write_artifact(&plan.paths.dh_params, pem, DH_PARAMS_MODE)
}

/// Concatenate certificate, key and DH parameters, in that order.
fn build_combined(plan: &GenerationPlan, combined: &Path) -> Result<()> {
    let mut bundle = String::new();
    for part in [&plan.paths.cert, &plan.paths.key, &plan.paths.dh_params] {
        let text = read_to_string(part)?;
        bundle.push_str(&text);
        if !text.ends_with('\n') {
            bundle.push('\n');
        }
    }
    write_artifact(combined, &bundle, COMBINED_MODE)
}

/// Build the combined PEM and refresh the trust store once every artifact of
/// the run is stored.
///
/// `trust` is only given for runs that touched the system certificate
/// directories. A failed refresh is returned as a warning.
pub fn finalize(plan: &GenerationPlan, trust: Option<&dyn TrustStore>) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if let Some(combined) = &plan.paths.combined {
        build_combined(plan, combined)?;
    }

    if let Some(store) = trust {
        log::debug!("refreshing {}", store.name());
        if let Err(e) = store.refresh() {
            warnings.push(format!("trust store refresh failed: {}", e));
        }
    }

    Ok(warnings)
}
