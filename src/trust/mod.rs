// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Refreshing the system CA trust store after certificates change.

#[cfg(target_os = "linux")]
mod linux;

use crate::error::Result;

pub trait TrustStore {
    /// Rebuild the hashed certificate directory / bundle from the sources.
    fn refresh(&self) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub fn get_trust_store() -> Box<dyn TrustStore> {
    #[cfg(target_os = "linux")]
    {
        Box::new(linux::LinuxTrustStore::detect())
    }

    #[cfg(not(target_os = "linux"))]
    {
        Box::new(NullTrustStore)
    }
}

/// Trust store that does nothing, for platforms without a rehash tool.
pub struct NullTrustStore;

impl TrustStore for NullTrustStore {
    fn refresh(&self) -> Result<()> {
        log::debug!("no trust store refresh on this platform");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Unsupported"
    }
}
