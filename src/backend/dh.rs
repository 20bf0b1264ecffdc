// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Named Diffie-Hellman groups.
//!
//! Parameters are never generated ad hoc: each supported size maps to a
//! published group with a generator of 2.

/// DH sizes accepted on the command line.
pub const SUPPORTED_BITS: [u32; 3] = [1024, 2048, 4096];

/// Sizes that are accepted but produce a weakness advisory.
pub const WEAK_BITS: u32 = 1024;

/// A published DH group and its PKCS#3 PEM encoding.
#[derive(Debug, Clone, Copy)]
pub struct NamedGroup {
    pub bits: u32,
    pub name: &'static str,
    /// Group name understood by `openssl genpkey -pkeyopt group:<name>`, if any
    pub openssl_group: Option<&'static str>,
    pub pem: &'static str,
}

/// RFC 2409 Second Oakley Group (1024-bit MODP).
const OAKLEY_GROUP_2: &str = "\
-----BEGIN DH PARAMETERS-----
MIGHAoGBAP//////////yQ/aoiFowjTExmKLgNwc0SkCTgiKZ8x0Agu+pjsTmyJR
Sgh5jjQE3e+VGbPNOkMbMCsKbfJfFDdP4TVtbVHCReSFtXZiXn7G9ExC6aY37WsL
/1y29Aa37e44a/taiZ+lrp8kEXxLH+ZJKGZR7OZTgf//////////AgEC
-----END DH PARAMETERS-----
";

/// RFC 7919 ffdhe2048.
const FFDHE2048: &str = "\
-----BEGIN DH PARAMETERS-----
MIIBCAKCAQEA//////////+t+FRYortKmq/cViAnPTzx2LnFg84tNpWp4TZBFGQz
+8yTnc4kmz75fS/jY2MMddj2gbICrsRhetPfHtXV/WVhJDP1H18GbtCFY2VVPe0a
87VXE15/V8k1mE8McODmi3fipona8+/och3xWKE2rec1MKzKT0g6eXq8CrGCsyT7
YdEIqUuyyOP7uWrat2DX9GgdT0Kj3jlN9K5W7edjcrsZCwenyO4KbXCeAvzhzffi
7MA0BM0oNC9hkXL+nOmFg/+OTxIy7vKBg8P+OxtMb61zO7X8vC7CIAXFjvGDfRaD
ssbzSibBsu/6iGtCOGEoXJf//////////wIBAg==
-----END DH PARAMETERS-----
";

/// RFC 7919 ffdhe4096.
const FFDHE4096: &str = "\
-----BEGIN DH PARAMETERS-----
MIICCAKCAgEA//////////+t+FRYortKmq/cViAnPTzx2LnFg84tNpWp4TZBFGQz
+8yTnc4kmz75fS/jY2MMddj2gbICrsRhetPfHtXV/WVhJDP1H18GbtCFY2VVPe0a
87VXE15/V8k1mE8McODmi3fipona8+/och3xWKE2rec1MKzKT0g6eXq8CrGCsyT7
YdEIqUuyyOP7uWrat2DX9GgdT0Kj3jlN9K5W7edjcrsZCwenyO4KbXCeAvzhzffi
7MA0BM0oNC9hkXL+nOmFg/+OTxIy7vKBg8P+OxtMb61zO7X8vC7CIAXFjvGDfRaD
ssbzSibBsu/6iGtCOGEfz9zeNVs7ZRkDW7w09N75nAI4YbRvydbmyQd62R0mkff3
7lmMsPrBhtkcrv4TCYUTknC0EwyTvEN5RPT9RFLi103TZPLiHnH1S/9croKrnJ32
nuhtK8UiNjoNq8Uhl5sN6todv5pC1cRITgq80Gv6U93vPBsg7j/VnXwl5B0rZp4e
8W5vUsMWTfT7eTDp5OWIV7asfV9C1p9tGHdjzx1VA0AEh/VbpX4xzHpxNciG77Qx
iu1qHgEtnmgyqQdgCpGBMMRtx3j5ca0AOAkpmaMzy4t6Gh25PXFAADwqTs6p+Y0K
zAqCkc3OyX3Pjsm1Wn+IpGtNtahR9EGC4caKAH5eZV9q//////////8CAQI=
-----END DH PARAMETERS-----
";

static GROUPS: [NamedGroup; 3] = [
    NamedGroup {
        bits: 1024,
        name: "RFC 2409 Oakley Group 2",
        openssl_group: None,
        pem: OAKLEY_GROUP_2,
    },
    NamedGroup {
        bits: 2048,
        name: "RFC 7919 ffdhe2048",
        openssl_group: Some("ffdhe2048"),
        pem: FFDHE2048,
    },
    NamedGroup {
        bits: 4096,
        name: "RFC 7919 ffdhe4096",
        openssl_group: Some("ffdhe4096"),
        pem: FFDHE4096,
    },
];

pub fn is_supported(bits: u32) -> bool {
    SUPPORTED_BITS.contains(&bits)
}

/// The named group for a size, if supported.
pub fn group(bits: u32) -> Option<&'static NamedGroup> {
    GROUPS.iter().find(|g| g.bits == bits)
}
