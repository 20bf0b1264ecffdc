// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Parse X.509 certificates without shelling out to openssl.

use crate::error::{Error, Result};
use std::path::Path;
use x509_parser::prelude::*;

#[derive(Debug, Clone)]
pub struct CertInfo {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub signature_algorithm: String,
    pub not_after_timestamp: i64,
    pub not_before_timestamp: i64,
    pub common_name: Option<String>,
    /// DNS and IP entries, in certificate order
    pub subject_alt_names: Vec<String>,
    pub is_ca: bool,
    /// Issuer and subject are identical
    pub self_signed: bool,
}

fn format_date(timestamp: i64) -> String {
    match ::time::OffsetDateTime::from_unix_timestamp(timestamp) {
        Ok(dt) => format!("{}-{:02}-{:02}", dt.year(), dt.month() as u8, dt.day()),
        Err(_) => "Invalid date".to_string(),
    }
}

impl CertInfo {
    pub fn expiry_string(&self) -> String {
        format_date(self.not_after_timestamp)
    }

    pub fn days_remaining(&self) -> i64 {
        let now = ::time::OffsetDateTime::now_utc();
        match ::time::OffsetDateTime::from_unix_timestamp(self.not_after_timestamp) {
            Ok(expiry) => (expiry - now).whole_days(),
            Err(_) => -1, // Treat invalid timestamps as expired
        }
    }

    /// Human-readable summary printed by `--verbose`.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Subject:      {}", self.subject),
            format!("Issuer:       {}", self.issuer),
            format!("Serial:       {}", self.serial),
            format!("Signature:    {}", self.signature_algorithm),
            format!("Not before:   {}", format_date(self.not_before_timestamp)),
            format!(
                "Not after:    {} ({} days)",
                self.expiry_string(),
                self.days_remaining()
            ),
        ];
        if !self.subject_alt_names.is_empty() {
            lines.push(format!("Alt names:    {}", self.subject_alt_names.join(", ")));
        }
        lines
    }
}

fn signature_name(oid: &str) -> String {
    match oid {
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256".to_string(),
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384".to_string(),
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption".to_string(),
        "1.3.101.112" => "ED25519".to_string(),
        other => other.to_string(),
    }
}

pub fn parse_cert_file(path: &Path) -> Result<CertInfo> {
    let pem_data = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_cert_pem(&pem_data)
}

pub fn parse_cert_pem(pem_str: &str) -> Result<CertInfo> {
    let pem = ::pem::parse(pem_str)
        .map_err(|e| Error::CertParse(format!("Failed to parse PEM: {}", e)))?;

    if pem.tag() != "CERTIFICATE" {
        return Err(Error::CertParse(format!(
            "Expected CERTIFICATE, got {}",
            pem.tag()
        )));
    }

    let (_, cert) = X509Certificate::from_der(pem.contents())
        .map_err(|e| Error::CertParse(format!("Invalid X.509: {}", e)))?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(String::from);

    let mut subject_alt_names = Vec::new();
    let mut is_ca = false;

    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::SubjectAlternativeName(san) => {
                for name in &san.general_names {
                    match name {
                        GeneralName::DNSName(dns) => subject_alt_names.push(dns.to_string()),
                        GeneralName::IPAddress(ip_bytes) if ip_bytes.len() == 4 => {
                            let ip = std::net::Ipv4Addr::new(
                                ip_bytes[0],
                                ip_bytes[1],
                                ip_bytes[2],
                                ip_bytes[3],
                            );
                            subject_alt_names.push(ip.to_string());
                        }
                        GeneralName::IPAddress(ip_bytes) if ip_bytes.len() == 16 => {
                            if let Ok(bytes) = <[u8; 16]>::try_from(*ip_bytes) {
                                subject_alt_names.push(std::net::Ipv6Addr::from(bytes).to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            ParsedExtension::BasicConstraints(bc) => {
                is_ca = bc.ca;
            }
            _ => {}
        }
    }

    Ok(CertInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial_as_string(),
        signature_algorithm: signature_name(&cert.signature_algorithm.algorithm.to_id_string()),
        not_after_timestamp: cert.validity().not_after.timestamp(),
        not_before_timestamp: cert.validity().not_before.timestamp(),
        common_name,
        subject_alt_names,
        is_ca,
        self_signed: cert.subject().as_raw() == cert.issuer().as_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CryptoBackend, NativeBackend};
    use crate::san::{SanList, SanSet, SubjectAltName};
    use crate::template::Template;

    fn issue(days: u32) -> String {
        let mut sans = SanSet::new();
        sans.insert(SubjectAltName::Dns("localhost".into()));
        sans.insert(SubjectAltName::Ip("::1".parse().expect("valid ip")));
        let list = SanList {
            common_name: "localhost".into(),
            sans,
        };
        let template = Template::from_text(
            Path::new("t.cnf"),
            include_str!("../templates/localcert.cnf"),
        )
        .render(&list);
        NativeBackend
            .issue_certificate(&template, days)
            .expect("certificate should be issued")
            .cert_pem
    }

    #[test]
    fn test_parse_cert_pem() {
        let info = parse_cert_pem(&issue(30)).expect("certificate should parse");

        assert!(info.days_remaining() >= 29);
        assert!(info.days_remaining() <= 30);
        assert_eq!(info.common_name, Some("localhost".to_string()));
        assert_eq!(info.subject_alt_names, vec!["localhost", "::1"]);
        assert!(!info.is_ca);
        assert!(info.self_signed);
        assert_eq!(info.signature_algorithm, "ecdsa-with-SHA256");
    }

    #[test]
    fn test_parse_cert_file() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        let path = dir.path().join("c.crt");
        std::fs::write(&path, issue(5)).expect("certificate should be written");
        let info = parse_cert_file(&path).expect("certificate file should parse");
        assert_eq!(info.common_name.as_deref(), Some("localhost"));

        assert!(matches!(
            parse_cert_file(&dir.path().join("missing.crt")),
            Err(Error::ReadFile { .. })
        ));
    }

    #[test]
    fn test_rejects_non_certificate_pem() {
        let dh = crate::backend::dh::group(2048).expect("2048 is supported").pem;
        assert!(matches!(parse_cert_pem(dh), Err(Error::CertParse(_))));
        assert!(matches!(parse_cert_pem("junk"), Err(Error::CertParse(_))));
    }

    #[test]
    fn test_expiry_string() {
        let info = parse_cert_pem(&issue(30)).expect("certificate should parse");

        let expiry = info.expiry_string();
        // Should be in YYYY-MM-DD format
        assert!(expiry.len() == 10);
        assert!(expiry.chars().nth(4) == Some('-'));
        assert!(expiry.chars().nth(7) == Some('-'));
    }

    #[test]
    fn test_describe() {
        let info = parse_cert_pem(&issue(30)).expect("certificate should parse");
        let lines = info.describe();
        assert!(lines[0].contains("CN=localhost"));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("Alt names:") && l.contains("::1")));
    }
}
