// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Subject alternative name construction.

use crate::error::{Error, Result};
use crate::host::HostIdentity;
use crate::plan::Mode;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Loopback address always included with `--ip`.
pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// A single subject alternative name entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectAltName {
    Dns(String),
    Ip(IpAddr),
}

impl SubjectAltName {
    /// Key prefix used in the template's `[alt_names]` section.
    pub fn kind(&self) -> &'static str {
        match self {
            SubjectAltName::Dns(_) => "DNS",
            SubjectAltName::Ip(_) => "IP",
        }
    }

    pub fn value(&self) -> String {
        match self {
            SubjectAltName::Dns(name) => name.clone(),
            SubjectAltName::Ip(ip) => ip.to_string(),
        }
    }
}

impl fmt::Display for SubjectAltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

/// Ordered subject alternative names without duplicates.
///
/// Entries compare by their `KIND:value` string, so `DNS:127.0.0.1` and
/// `IP:127.0.0.1` are distinct while repeated names collapse to the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanSet {
    entries: Vec<SubjectAltName>,
}

impl SanSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns false if an identical entry is already present.
    pub fn insert(&mut self, entry: SubjectAltName) -> bool {
        let key = entry.to_string();
        if self.entries.iter().any(|e| e.to_string() == key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    fn insert_dns(&mut self, name: &str) {
        if !name.is_empty() {
            self.insert(SubjectAltName::Dns(name.to_string()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectAltName> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// DNS entries in order.
    pub fn dns_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                SubjectAltName::Dns(name) => Some(name.as_str()),
                SubjectAltName::Ip(_) => None,
            })
            .collect()
    }

    /// Render as `DNS.1 = ...` / `IP.1 = ...` lines, numbered per kind.
    pub fn to_config_lines(&self) -> Vec<String> {
        let mut dns = 0;
        let mut ip = 0;
        self.entries
            .iter()
            .map(|entry| {
                let index = match entry {
                    SubjectAltName::Dns(_) => {
                        dns += 1;
                        dns
                    }
                    SubjectAltName::Ip(_) => {
                        ip += 1;
                        ip
                    }
                };
                format!("{}.{} = {}", entry.kind(), index, entry.value())
            })
            .collect()
    }
}

/// Output of [`build`]: the subject common name and its alternative names.
#[derive(Debug, Clone)]
pub struct SanList {
    pub common_name: String,
    pub sans: SanSet,
}

/// Build the common name and SAN set for a certificate.
///
/// With no `names`, the local host identity stands in: the DNS domain in
/// wildcard mode, the FQDN otherwise, falling back to the bare hostname.
pub fn build(
    mode: Mode,
    names: &[String],
    include_ip: bool,
    host: &dyn HostIdentity,
) -> Result<SanList> {
    for name in names {
        validate_name(name)?;
    }

    let names: Vec<String> = if names.is_empty() {
        let local = if mode == Mode::Wildcard {
            host.domain()
        } else {
            host.fqdn()
        }
        .unwrap_or_else(|| host.hostname());
        validate_name(&local)?;
        vec![local]
    } else if mode == Mode::Wildcard {
        // `*.example.com` and `example.com` cover the same pair
        names
            .iter()
            .map(|n| n.strip_prefix("*.").unwrap_or(n).to_string())
            .collect()
    } else {
        names.to_vec()
    };

    let mut sans = SanSet::new();
    for name in &names {
        if mode == Mode::Wildcard {
            sans.insert_dns(name);
            sans.insert_dns(&format!("*.{}", name));
        } else {
            let (host_part, domain_part) = split_fqdn(name);
            sans.insert_dns(name);
            sans.insert_dns(domain_part);
            if host_part != "*" {
                sans.insert_dns(host_part);
            }
        }
    }

    if include_ip {
        let mut addresses = host.addresses();
        addresses.push(LOOPBACK);
        for ip in addresses {
            sans.insert(SubjectAltName::Dns(ip.to_string()));
            sans.insert(SubjectAltName::Ip(ip));
        }
    }

    let common_name = names.first().cloned().unwrap_or_default();
    Ok(SanList { common_name, sans })
}

/// Split `host.example.com` into (`host`, `example.com`).
fn split_fqdn(fqdn: &str) -> (&str, &str) {
    fqdn.split_once('.').unwrap_or((fqdn, ""))
}

/// Reject names that would corrupt the rendered template or a file name.
fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid("name cannot start or end with a dot"));
    }
    if name.contains("..") {
        return Err(invalid("name contains an empty label"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_control() || c.is_whitespace() || "/\\=[]#;".contains(*c))
    {
        return Err(invalid(&format!("name contains invalid character: {:?}", c)));
    }
    // Only a single leading `*.` label is allowed
    if name.strip_prefix("*.").unwrap_or(name).contains('*') {
        return Err(invalid("wildcard is only allowed as the leftmost label"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::FixedHost;

    fn host() -> FixedHost {
        FixedHost::lan()
    }

    fn dns(list: &SanList) -> Vec<&str> {
        list.sans.dns_names()
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let names = vec!["a.example.com".to_string(), "a.example.com".to_string()];
        let list = build(Mode::Custom, &names, false, &host()).expect("build should succeed");
        assert_eq!(list.sans.len(), 3);
        assert_eq!(dns(&list), vec!["a.example.com", "example.com", "a"]);
        assert_eq!(list.common_name, "a.example.com");
    }

    #[test]
    fn test_wildcard_pairs() {
        let list = build(Mode::Wildcard, &["example.com".into()], false, &host())
            .expect("build should succeed");
        assert_eq!(dns(&list), vec!["example.com", "*.example.com"]);
        assert_eq!(list.common_name, "example.com");
    }

    #[test]
    fn test_first_name_is_common_name() {
        let names = vec!["web.example.org".to_string(), "api.example.org".to_string()];
        let list = build(Mode::Custom, &names, false, &host()).expect("build should succeed");
        assert_eq!(list.common_name, "web.example.org");
        assert_eq!(
            dns(&list),
            vec!["web.example.org", "example.org", "web", "api.example.org", "api"]
        );
    }

    #[test]
    fn test_bare_name_has_no_domain_part() {
        let list = build(Mode::Custom, &["intranet".into()], false, &host())
            .expect("build should succeed");
        assert_eq!(dns(&list), vec!["intranet"]);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let names = vec!["A.example.com".to_string(), "a.example.com".to_string()];
        let list = build(Mode::Custom, &names, false, &host()).expect("build should succeed");
        assert_eq!(
            dns(&list),
            vec!["A.example.com", "example.com", "A", "a.example.com", "a"]
        );
    }

    #[test]
    fn test_empty_names_use_fqdn() {
        let list = build(Mode::Default, &[], false, &host()).expect("build should succeed");
        assert_eq!(list.common_name, "box.lan.example");
        assert_eq!(dns(&list), vec!["box.lan.example", "lan.example", "box"]);
    }

    #[test]
    fn test_empty_names_wildcard_use_domain() {
        let list = build(Mode::Wildcard, &[], false, &host()).expect("build should succeed");
        assert_eq!(list.common_name, "lan.example");
        assert_eq!(dns(&list), vec!["lan.example", "*.lan.example"]);
    }

    #[test]
    fn test_empty_names_fall_back_to_hostname() {
        let bare = FixedHost {
            fqdn: None,
            addresses: Vec::new(),
        };
        let list = build(Mode::Wildcard, &[], false, &bare).expect("build should succeed");
        assert_eq!(list.common_name, "box");
        let list = build(Mode::Custom, &[], false, &bare).expect("build should succeed");
        assert_eq!(dns(&list), vec!["box"]);
    }

    #[test]
    fn test_include_ip_adds_dns_and_ip_entries() {
        let list =
            build(Mode::Custom, &["intranet".into()], true, &host()).expect("build should succeed");
        let entries: Vec<String> = list.sans.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            entries,
            vec![
                "DNS:intranet",
                "DNS:192.168.1.10",
                "IP:192.168.1.10",
                "DNS:127.0.0.1",
                "IP:127.0.0.1",
            ]
        );
    }

    #[test]
    fn test_loopback_not_duplicated() {
        let with_loopback = FixedHost {
            fqdn: None,
            addresses: vec![LOOPBACK],
        };
        let list =
            build(Mode::Custom, &["x".into()], true, &with_loopback).expect("build should succeed");
        assert_eq!(list.sans.len(), 3);
    }

    #[test]
    fn test_config_lines_indexed_per_kind() {
        let list =
            build(Mode::Custom, &["a.example".into()], true, &host()).expect("build should succeed");
        assert_eq!(
            list.sans.to_config_lines(),
            vec![
                "DNS.1 = a.example",
                "DNS.2 = example",
                "DNS.3 = a",
                "DNS.4 = 192.168.1.10",
                "IP.1 = 192.168.1.10",
                "DNS.5 = 127.0.0.1",
                "IP.2 = 127.0.0.1",
            ]
        );
    }

    #[test]
    fn test_invalid_names_rejected() {
        for bad in [
            "", "a b", "a/b", "a\\b", "x=y", "[alt]", ".lead", "trail.", "a..b", "a\nb", "*",
            "a.*.example", "*.*.example",
        ] {
            let result = build(Mode::Custom, &[bad.to_string()], false, &host());
            assert!(
                matches!(result, Err(Error::InvalidName { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_wildcard_prefix_not_doubled() {
        let names = vec!["*.example.com".to_string(), "example.com".to_string()];
        let list = build(Mode::Wildcard, &names, false, &host()).expect("build should succeed");
        assert_eq!(dns(&list), vec!["example.com", "*.example.com"]);
        assert_eq!(list.common_name, "example.com");
    }

    #[test]
    fn test_wildcard_name_in_custom_mode() {
        let list = build(Mode::Custom, &["*.example.com".into()], false, &host())
            .expect("build should succeed");
        assert_eq!(dns(&list), vec!["*.example.com", "example.com"]);
    }

    #[test]
    fn test_host_identity_is_validated() {
        let odd = FixedHost {
            fqdn: Some("box]\nDNS.9 = evil"),
            addresses: Vec::new(),
        };
        for mode in [Mode::Default, Mode::Custom] {
            assert!(matches!(
                build(mode, &[], false, &odd),
                Err(Error::InvalidName { .. })
            ));
        }
    }
}
