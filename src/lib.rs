// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Self-signed certificates, signing requests and DH parameters for local
//! services.
//!
//! ```rust,no_run
//! use localcert::{generate, get_backend, plan, Config, GenerationRequest, Mode, Paths, SystemHost};
//!
//! let paths = Paths::new()?;
//! let config = Config::load(&paths.config)?;
//!
//! let request = GenerationRequest {
//!     mode: Mode::Custom,
//!     names: vec!["intranet.example.com".into()],
//!     include_ip: false,
//!     emit_csr: true,
//!     force_overwrite: false,
//!     expiry_days: localcert::expiry::resolve(&config.expiry)?,
//!     dh_bits: config.effective_dh_bits(None)?,
//!     template_path: config.template_path(&paths),
//!     output_override: Some("/srv/tls/intranet".into()),
//!     cert_name: config.cert_name.clone(),
//! };
//! let plan = plan::resolve(&request, &paths, &SystemHost)?;
//! let report = generate(&plan, &paths, get_backend(config.backend).as_ref())?;
//! for path in &report.written {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), localcert::Error>(())
//! ```

/// Permissions, combined PEM and trust store refresh.
pub mod assemble;
/// Crypto backends.
pub mod backend;
/// Running external tools.
pub mod command;
/// Configuration handling.
pub mod config;
/// Error types.
pub mod error;
/// Validity periods.
pub mod expiry;
/// Filesystem utilities.
pub mod fs;
/// Executing a plan.
pub mod generate;
/// Overwrite protection.
pub mod guard;
/// Local host identity.
pub mod host;
/// Mode and path resolution.
pub mod plan;
/// Subject alternative names.
pub mod san;
/// Interrupt handling.
pub mod signals;
/// Request templates.
pub mod template;
/// System trust store refresh.
pub mod trust;
/// X.509 certificate parsing.
pub mod x509;

pub use backend::{get_backend, BackendFailure, BackendKind, CryptoBackend, IssuedCertificate};
pub use config::{Config, Paths};
pub use error::{Error, Result};
pub use generate::{generate, GenerationReport};
pub use host::{HostIdentity, SystemHost};
pub use plan::{ArtifactPaths, GenerationPlan, GenerationRequest, Mode};
pub use san::{SanList, SanSet, SubjectAltName};
pub use template::{RenderedTemplate, Template};
pub use x509::{parse_cert_file, parse_cert_pem, CertInfo};
