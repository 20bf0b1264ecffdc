// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Crypto backends: the operations that actually produce key material.

pub mod dh;
mod native;
mod openssl;

pub use native::NativeBackend;
pub use openssl::OpensslBackend;

use crate::template::RenderedTemplate;
use serde::Deserialize;
use std::fmt;

/// A backend diagnostic, passed through to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure(pub String);

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BackendFailure> for crate::Error {
    fn from(failure: BackendFailure) -> Self {
        crate::Error::Backend(failure.0)
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendFailure>;

/// A self-signed certificate and the private key it was issued for.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub cert_pem: String,
    pub key_pem: String,
}

pub trait CryptoBackend {
    /// Issue a self-signed certificate (SHA-256) together with a new private key.
    fn issue_certificate(
        &self,
        template: &RenderedTemplate,
        days: u32,
    ) -> BackendResult<IssuedCertificate>;

    /// Create a certificate signing request signed with an existing key.
    fn issue_csr(&self, template: &RenderedTemplate, key_pem: &str) -> BackendResult<String>;

    /// Produce PEM-encoded parameters of a named DH group.
    fn generate_dh_params(&self, bits: u32) -> BackendResult<String>;

    fn name(&self) -> &'static str;
}

/// Which backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process generation with rcgen
    #[default]
    Native,
    /// The `openssl` command-line tool
    Openssl,
}

pub fn get_backend(kind: BackendKind) -> Box<dyn CryptoBackend> {
    match kind {
        BackendKind::Native => Box::new(NativeBackend),
        BackendKind::Openssl => Box::new(OpensslBackend::new()),
    }
}
