// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::plan::GenerationPlan;

/// Refuse to clobber an existing certificate or key, and make sure
/// DH-params-only runs have the pair they need for the combined PEM.
///
/// Runs before any file is written. The check is not atomic against another
/// process creating the files afterwards.
pub fn check(plan: &GenerationPlan) -> Result<()> {
    let targets = [&plan.paths.cert, &plan.paths.key];

    if !plan.issue_cert {
        if let Some(missing) = targets.into_iter().find(|p| !p.is_file()) {
            return Err(Error::MissingPrerequisite(missing.clone()));
        }
        return Ok(());
    }

    if plan.force_overwrite {
        return Ok(());
    }
    if let Some(existing) = targets.into_iter().find(|p| p.exists()) {
        return Err(Error::WouldOverwrite(existing.clone()));
    }
    Ok(())
}
