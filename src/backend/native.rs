// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use super::{dh, BackendFailure, BackendResult, CryptoBackend, IssuedCertificate};
use crate::template::RenderedTemplate;
use rcgen::string::Ia5String;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, SanType,
};
use std::net::IpAddr;

/// In-process backend built on rcgen. Keys are ECDSA P-256, signatures SHA-256.
pub struct NativeBackend;

fn failure(context: &str, e: impl std::fmt::Display) -> BackendFailure {
    BackendFailure(format!("{}: {}", context, e))
}

/// Map an OpenSSL distinguished name field to its rcgen type.
fn dn_type(field: &str) -> Option<DnType> {
    match field {
        "CN" | "commonName" => Some(DnType::CommonName),
        "C" | "countryName" => Some(DnType::CountryName),
        "ST" | "stateOrProvinceName" => Some(DnType::StateOrProvinceName),
        "L" | "localityName" => Some(DnType::LocalityName),
        "O" | "organizationName" => Some(DnType::OrganizationName),
        "OU" | "organizationalUnitName" => Some(DnType::OrganizationalUnitName),
        _ => None,
    }
}

/// Translate an `[ alt_names ]` entry such as `DNS.1 = host` into a SAN.
fn san_entry(key: &str, value: &str) -> BackendResult<SanType> {
    let kind = key.split('.').next().unwrap_or(key);
    let ia5 = |v: &str| -> BackendResult<Ia5String> {
        Ia5String::try_from(v.to_string())
            .map_err(|e| failure(&format!("invalid {} value '{}'", kind, v), e))
    };
    match kind {
        "DNS" => Ok(SanType::DnsName(ia5(value)?)),
        "IP" => value
            .parse::<IpAddr>()
            .map(SanType::IpAddress)
            .map_err(|e| failure(&format!("invalid IP value '{}'", value), e)),
        "email" => Ok(SanType::Rfc822Name(ia5(value)?)),
        "URI" => Ok(SanType::URI(ia5(value)?)),
        other => Err(BackendFailure(format!(
            "unsupported subjectAltName type '{}' in [ alt_names ]",
            other
        ))),
    }
}

/// Build certificate parameters from the rendered template.
fn params_from_template(template: &RenderedTemplate) -> BackendResult<CertificateParams> {
    let mut params = CertificateParams::default();
    // rcgen's default subject carries a placeholder CN
    params.distinguished_name = DistinguishedName::new();

    for (field, value) in template.distinguished_name() {
        match dn_type(&field) {
            Some(ty) => params.distinguished_name.push(ty, value),
            // Prompt texts, defaults and min/max hints are not subject fields
            None => log::debug!("ignoring distinguished name field {}", field),
        }
    }
    if params.distinguished_name.get(&DnType::CommonName).is_none() {
        params
            .distinguished_name
            .push(DnType::CommonName, template.common_name());
    }

    for (key, value) in template.alt_names() {
        params.subject_alt_names.push(san_entry(&key, &value)?);
    }

    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    Ok(params)
}

impl CryptoBackend for NativeBackend {
    fn issue_certificate(
        &self,
        template: &RenderedTemplate,
        days: u32,
    ) -> BackendResult<IssuedCertificate> {
        let mut params = params_from_template(template)?;

        let now = time::OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + time::Duration::days(i64::from(days));

        let key_pair = KeyPair::generate().map_err(|e| failure("key generation failed", e))?;
        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| failure("self-signing failed", e))?;

        Ok(IssuedCertificate {
            cert_pem: cert.pem(),
            key_pem: key_pair.serialize_pem(),
        })
    }

    fn issue_csr(&self, template: &RenderedTemplate, key_pem: &str) -> BackendResult<String> {
        let params = params_from_template(template)?;
        let key_pair = KeyPair::from_pem(key_pem).map_err(|e| failure("unusable private key", e))?;
        let csr = params
            .serialize_request(&key_pair)
            .map_err(|e| failure("signing request failed", e))?;
        csr.pem().map_err(|e| failure("encoding request failed", e))
    }

    fn generate_dh_params(&self, bits: u32) -> BackendResult<String> {
        dh::group(bits)
            .map(|group| group.pem.to_string())
            .ok_or_else(|| BackendFailure(format!("no named DH group of {} bits", bits)))
    }

    fn name(&self) -> &'static str {
        "native (rcgen)"
    }
}
