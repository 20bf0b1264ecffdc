// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::command::run_command_with_timeout;
use crate::error::{Error, Result};
use crate::trust::TrustStore;
use std::path::Path;

/// Timeout for the distribution's update command
const UPDATE_TIMEOUT_SECS: u64 = 60;

pub struct LinuxTrustStore {
    distro: LinuxDistro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinuxDistro {
    Debian, // Ubuntu, Mint, Pop!_OS, etc.
    Fedora, // RHEL, CentOS, Rocky, Alma
    Arch,   // Manjaro, EndeavourOS
    Unknown,
}

impl LinuxDistro {
    fn update_command(&self) -> Option<&'static [&'static str]> {
        match self {
            LinuxDistro::Debian => Some(&["update-ca-certificates"]),
            LinuxDistro::Fedora => Some(&["update-ca-trust", "extract"]),
            LinuxDistro::Arch => Some(&["trust", "extract-compat"]),
            LinuxDistro::Unknown => None,
        }
    }
}

impl LinuxTrustStore {
    pub fn detect() -> Self {
        let os_release = std::fs::read_to_string("/etc/os-release").ok();
        Self {
            distro: detect_distro(os_release.as_deref(), |p| p.exists()),
        }
    }
}

impl TrustStore for LinuxTrustStore {
    fn refresh(&self) -> Result<()> {
        let (cmd, args) = self
            .distro
            .update_command()
            .and_then(|c| c.split_first())
            .ok_or_else(|| {
                Error::TrustStore("unknown Linux distribution, no update command to run".into())
            })?;

        let output = run_command_with_timeout(cmd, args, UPDATE_TIMEOUT_SECS)?;
        if !output.status.success() {
            return Err(Error::Command {
                command: cmd.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        log::debug!(
            "{}: {}",
            cmd,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.distro {
            LinuxDistro::Debian => "Debian/Ubuntu ca-certificates",
            LinuxDistro::Fedora => "Fedora/RHEL ca-trust",
            LinuxDistro::Arch => "Arch trust",
            LinuxDistro::Unknown => "Linux (unknown)",
        }
    }
}

/// Identify the distribution from `/etc/os-release`, falling back to which
/// update tool is installed.
fn detect_distro(os_release: Option<&str>, exists: impl Fn(&Path) -> bool) -> LinuxDistro {
    if let Some(content) = os_release {
        let content = content.to_lowercase();

        if content.contains("debian")
            || content.contains("ubuntu")
            || content.contains("mint")
            || content.contains("pop!_os")
        {
            return LinuxDistro::Debian;
        }

        if content.contains("fedora")
            || content.contains("rhel")
            || content.contains("centos")
            || content.contains("rocky")
            || content.contains("alma")
        {
            return LinuxDistro::Fedora;
        }

        if content.contains("arch") || content.contains("manjaro") || content.contains("endeavour")
        {
            return LinuxDistro::Arch;
        }
    }

    if exists(Path::new("/usr/sbin/update-ca-certificates")) {
        return LinuxDistro::Debian;
    }
    if exists(Path::new("/usr/bin/update-ca-trust")) {
        return LinuxDistro::Fedora;
    }
    if exists(Path::new("/usr/bin/trust")) {
        return LinuxDistro::Arch;
    }

    LinuxDistro::Unknown
}
