// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scope
//!
//! The admissible roots of a session (§4.6): domains, addresses, CIDRs,
//! ASNs. Mutation is additive only; queries answer `IsAssetInScope`.

use horizon_domain::{Asset, EngineConfig};
use ipnet::IpNet;
use parking_lot::RwLock;
use std::net::IpAddr;

/// A scope match result: the matched root asset key (if distinct from the
/// query) and a confidence in `0..=100`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeMatch {
    pub matched: String,
    pub confidence: u8,
}

struct ScopeInner {
    domains: Vec<String>,
    addresses: Vec<IpAddr>,
    cidrs: Vec<IpNet>,
    asns: Vec<u32>,
}

/// The configured roots that constrain what is considered in-bounds
/// (§4.6). Each set is lock-guarded and mutation is additive only, per
/// §5's "Scope sets: guarded by per-set locks; additive mutations".
pub struct Scope(RwLock<ScopeInner>);

impl Scope {
    pub fn new() -> Self {
        Self(RwLock::new(ScopeInner {
            domains: Vec::new(),
            addresses: Vec::new(),
            cidrs: Vec::new(),
            asns: Vec::new(),
        }))
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let scope = Self::new();
        {
            let mut inner = scope.0.write();
            inner.domains = config.domains.iter().map(|d| d.trim().to_lowercase()).collect();
            inner.addresses = config.addresses.clone();
            inner.cidrs = config.cidrs.clone();
            inner.asns = config.asns.clone();
        }
        scope
    }

    pub fn add_domain(&self, domain: impl Into<String>) {
        self.0.write().domains.push(domain.into().trim().to_lowercase());
    }

    pub fn add_address(&self, address: IpAddr) {
        self.0.write().addresses.push(address);
    }

    pub fn add_cidr(&self, cidr: IpNet) {
        self.0.write().cidrs.push(cidr);
    }

    pub fn add_asn(&self, asn: u32) {
        self.0.write().asns.push(asn);
    }

    /// `IsAssetInScope` (§4.6): checks `asset` against the configured
    /// roots. `depth` is accepted for parity with the source contract
    /// (bounding how many labels of an FQDN are walked toward its parent
    /// before giving up) but the rule itself (exact match or `.`-suffix
    /// subdomain) does not require recursion to evaluate.
    pub fn is_asset_in_scope(&self, asset: &Asset, _depth: usize) -> Option<ScopeMatch> {
        let inner = self.0.read();
        match asset {
            Asset::Fqdn(f) => {
                let name = f.0.trim().to_lowercase();
                inner.domains.iter().find_map(|domain| {
                    if name == *domain || name.ends_with(&format!(".{domain}")) {
                        Some(ScopeMatch {
                            matched: domain.clone(),
                            confidence: 100,
                        })
                    } else {
                        None
                    }
                })
            }
            Asset::IpAddress(ip) => {
                if inner.addresses.iter().any(|a| a == ip) {
                    return Some(ScopeMatch {
                        matched: ip.to_string(),
                        confidence: 100,
                    });
                }
                inner.cidrs.iter().find_map(|net| {
                    if net.contains(ip) {
                        Some(ScopeMatch {
                            matched: net.to_string(),
                            confidence: 100,
                        })
                    } else {
                        None
                    }
                })
            }
            Asset::Netblock(net) => {
                if inner.cidrs.contains(net) {
                    Some(ScopeMatch {
                        matched: net.to_string(),
                        confidence: 100,
                    })
                } else {
                    None
                }
            }
            Asset::Asn(n) => {
                if inner.asns.contains(n) {
                    Some(ScopeMatch {
                        matched: format!("as{n}"),
                        confidence: 100,
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
