// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Local host identity: names and interface addresses.

use std::net::IpAddr;
use std::process::Command;

/// Source of the local host's names and addresses.
pub trait HostIdentity {
    /// Bare hostname, without any domain.
    fn hostname(&self) -> String;
    /// Fully-qualified domain name, if one is resolvable.
    fn fqdn(&self) -> Option<String>;
    /// Addresses of the local network interfaces (loopback excluded).
    fn addresses(&self) -> Vec<IpAddr>;

    /// DNS domain of the host, derived from the FQDN.
    fn domain(&self) -> Option<String> {
        self.fqdn()
            .and_then(|fqdn| fqdn.split_once('.').map(|(_, d)| d.to_string()))
            .filter(|d| !d.is_empty())
    }
}

/// The running system, queried through `gethostname` and the `hostname` tool.
pub struct SystemHost;

impl HostIdentity for SystemHost {
    fn hostname(&self) -> String {
        let name = gethostname::gethostname().to_string_lossy().into_owned();
        // Some systems report the FQDN here
        match name.split_once('.') {
            Some((short, _)) => short.to_string(),
            None => name,
        }
    }

    fn fqdn(&self) -> Option<String> {
        let fqdn = hostname_tool(&["--fqdn"])
            .map(|out| out.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().into_owned());

        // A name without a dot carries no domain part
        if fqdn.contains('.') {
            Some(fqdn)
        } else {
            None
        }
    }

    fn addresses(&self) -> Vec<IpAddr> {
        hostname_tool(&["-I"])
            .map(|out| parse_addresses(&out))
            .unwrap_or_default()
    }
}

fn hostname_tool(args: &[&str]) -> Option<String> {
    match Command::new("hostname").args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            log::debug!(
                "hostname {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            log::debug!("could not run hostname: {}", e);
            None
        }
    }
}

/// Parse whitespace-separated addresses, skipping loopback and anything unparsable.
fn parse_addresses(output: &str) -> Vec<IpAddr> {
    output
        .split_whitespace()
        // Strip IPv6 zone ID (e.g., "fe80::1%eth0")
        .filter_map(|token| token.split('%').next()?.parse::<IpAddr>().ok())
        .filter(|ip| !ip.is_loopback())
        .collect()
}
