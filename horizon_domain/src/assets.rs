// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Asset Payloads
//!
//! The typed values the engine discovers and persists. Every payload
//! implements [`AssetType`] (which pipeline it belongs to) and a stable,
//! case-folded [`Keyed::key`] used for per-session deduplication.
//!
//! The asset-graph persistence layer itself (how an `Entity` wrapping one of
//! these payloads is actually stored) is an external collaborator; this
//! module only names the payload shapes and their identity rules.

use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::OnceLock;

/// The tag used to route an [`Asset`] to the pipeline that consumes it.
///
/// `HandlerRegistration::event_type` and `AssetPipeline`'s key are both
/// `AssetKind` values; every handler's `event_type` must resolve to exactly
/// one pipeline (see `horizon::registry::Registry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Fqdn,
    IpAddress,
    Netblock,
    Asn,
    Url,
    ContactRecord,
    RegistrationRecord,
    TlsCertificate,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetKind::Fqdn => "fqdn",
            AssetKind::IpAddress => "ip_address",
            AssetKind::Netblock => "netblock",
            AssetKind::Asn => "asn",
            AssetKind::Url => "url",
            AssetKind::ContactRecord => "contact_record",
            AssetKind::RegistrationRecord => "registration_record",
            AssetKind::TlsCertificate => "tls_certificate",
        };
        f.write_str(s)
    }
}

/// A fully-qualified domain name.
///
/// `Key()` lowercases and trims the name so identity is case-insensitive:
/// `Key(FQDN{"Example.COM"}) == Key(FQDN{"example.com"})`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fqdn(pub String);

impl Fqdn {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The domain this FQDN would be a subdomain of, e.g. `www.a.com` -> `a.com`.
    pub fn parent(&self) -> Option<Fqdn> {
        self.0.trim().split_once('.').map(|(_, rest)| Fqdn(rest.to_string()))
    }

    /// Whether the name is a syntactically valid FQDN: dot-separated labels
    /// of letters, digits, and hyphens, no empty labels, no leading/trailing
    /// hyphen in a label, overall length under 254 bytes.
    pub fn is_valid(&self) -> bool {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
                .expect("static FQDN pattern must compile")
        });
        let trimmed = self.0.trim();
        !trimmed.is_empty() && trimmed.len() < 254 && re.is_match(trimmed)
    }
}

/// A contact record discovered from WHOIS/RDAP registration data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub full_name: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A registration record for an autonomous system or a domain (RDAP/WHOIS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub handle: String,
    pub name: Option<String>,
}

/// A TLS certificate, identified by its SHA-256 fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsCertificate {
    pub fingerprint_sha256: String,
    pub subject_common_name: Option<String>,
    pub subject_alt_names: Vec<String>,
}

impl TlsCertificate {
    /// Builds a certificate asset from raw DER bytes, computing the
    /// canonical SHA-256 fingerprint used as its key.
    pub fn from_der(der: &[u8], subject_common_name: Option<String>, subject_alt_names: Vec<String>) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(der);
        Self {
            fingerprint_sha256: hex::encode(digest),
            subject_common_name,
            subject_alt_names,
        }
    }
}

/// The discriminated union of everything the engine can discover.
///
/// Modeled as a tagged enum rather than a trait-object hierarchy: the
/// payload types differ, but there is no meaningful subtyping between them,
/// so a closed sum type is simpler than dynamic dispatch over a trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    Fqdn(Fqdn),
    IpAddress(IpAddr),
    Netblock(IpNet),
    Asn(u32),
    Url(String),
    ContactRecord(ContactRecord),
    RegistrationRecord(RegistrationRecord),
    TlsCertificate(TlsCertificate),
}

/// Identity and routing for an [`Asset`] payload.
///
/// Implemented directly on `Asset` (rather than per-variant structs
/// implementing a shared trait) since every payload lives behind the
/// same enum and callers always have an `Asset` in hand, not a bare
/// `Fqdn`/`IpAddr`/etc.
impl Asset {
    /// The pipeline this asset is routed to.
    pub fn asset_type(&self) -> AssetKind {
        match self {
            Asset::Fqdn(_) => AssetKind::Fqdn,
            Asset::IpAddress(_) => AssetKind::IpAddress,
            Asset::Netblock(_) => AssetKind::Netblock,
            Asset::Asn(_) => AssetKind::Asn,
            Asset::Url(_) => AssetKind::Url,
            Asset::ContactRecord(_) => AssetKind::ContactRecord,
            Asset::RegistrationRecord(_) => AssetKind::RegistrationRecord,
            Asset::TlsCertificate(_) => AssetKind::TlsCertificate,
        }
    }

    /// The stable, case-folded dedup key for this asset.
    ///
    /// FQDNs are lowercased and trimmed; IP addresses and netblocks use
    /// their canonical string form; everything else uses its natural
    /// identifier.
    pub fn key(&self) -> String {
        match self {
            Asset::Fqdn(f) => f.0.trim().to_lowercase(),
            Asset::IpAddress(ip) => ip.to_string(),
            Asset::Netblock(net) => net.to_string(),
            Asset::Asn(n) => format!("as{n}"),
            Asset::Url(u) => u.clone(),
            Asset::ContactRecord(c) => format!(
                "contact:{}:{}",
                c.organization.as_deref().unwrap_or(""),
                c.email.as_deref().unwrap_or("")
            ),
            Asset::RegistrationRecord(r) => format!("registration:{}", r.handle),
            Asset::TlsCertificate(t) => t.fingerprint_sha256.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_key_is_lowercased_and_trimmed() {
        let a = Asset::Fqdn(Fqdn::new("Example.COM"));
        let b = Asset::Fqdn(Fqdn::new("  example.com  "));
        assert_eq!(a.key(), "example.com");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn asset_type_routes_to_expected_kind() {
        assert_eq!(Asset::Asn(64512).asset_type(), AssetKind::Asn);
        assert_eq!(
            Asset::IpAddress("10.1.2.3".parse().unwrap()).asset_type(),
            AssetKind::IpAddress
        );
    }

    #[test]
    fn fqdn_parent_strips_leftmost_label() {
        let f = Fqdn::new("www.example.com");
        assert_eq!(f.parent(), Some(Fqdn::new("example.com")));
    }

    #[test]
    fn fqdn_validity_rejects_malformed_names() {
        assert!(Fqdn::new("www.example.com").is_valid());
        assert!(Fqdn::new("a.b.co").is_valid());
        assert!(!Fqdn::new("").is_valid());
        assert!(!Fqdn::new("-bad.example.com").is_valid());
        assert!(!Fqdn::new("no-tld").is_valid());
        assert!(!Fqdn::new("double..dot.com").is_valid());
    }

    proptest::proptest! {
        #[test]
        fn fqdn_key_always_lowercase(s in "[a-zA-Z0-9.-]{1,40}") {
            let key = Asset::Fqdn(Fqdn::new(s)).key();
            proptest::prop_assert_eq!(key.clone(), key.to_lowercase());
        }
    }
}
