//! Placement - picks the provider account and location for a new resource.
//!
//! The static resolver considers:
//! - Tenant allow-lists on each account
//! - `provider`, `account` and `location` hints from the resource properties
//! - Configuration order (first match wins)

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CloudError, Result};
use crate::model::{Placement, Properties};

/// Hint keys read from resource properties.
pub const HINT_PROVIDER: &str = "provider";
pub const HINT_ACCOUNT: &str = "account";
pub const HINT_LOCATION: &str = "location";

/// Maps a tenant and resource hints to a provider account and location.
#[async_trait]
pub trait PlacementResolver: Send + Sync {
    /// `ProviderUnavailable` when nothing can host the resource.
    async fn place(&self, tenant_id: &str, hints: &Properties) -> Result<Placement>;
}

/// A provider account resources can be placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub id: String,
    pub provider_type: String,
    /// First entry is the default location.
    pub locations: Vec<String>,
    /// Tenants allowed to use this account. Empty means everyone.
    #[serde(default)]
    pub tenants: Vec<String>,
}

impl ProviderAccount {
    pub fn new(id: impl Into<String>, provider_type: impl Into<String>, locations: &[&str]) -> Self {
        Self {
            id: id.into(),
            provider_type: provider_type.into(),
            locations: locations.iter().map(|l| l.to_string()).collect(),
            tenants: Vec::new(),
        }
    }

    pub fn for_tenants(mut self, tenants: &[&str]) -> Self {
        self.tenants = tenants.iter().map(|t| t.to_string()).collect();
        self
    }

    fn admits(&self, tenant_id: &str) -> bool {
        self.tenants.is_empty() || self.tenants.iter().any(|t| t == tenant_id)
    }
}

/// Parses `id:provider_type:location[,location...]`.
impl FromStr for ProviderAccount {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(id), Some(provider_type), Some(locations)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!(
                "Invalid account format '{}', expected id:provider_type:location[,location]",
                s
            ));
        };

        let locations: Vec<String> = locations
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();

        if id.is_empty() || provider_type.is_empty() || locations.is_empty() {
            return Err(format!("Account '{}' needs an id, a provider type and a location", s));
        }

        Ok(Self {
            id: id.to_string(),
            provider_type: provider_type.to_string(),
            locations,
            tenants: Vec::new(),
        })
    }
}

/// Placement over a fixed list of accounts.
pub struct StaticPlacement {
    accounts: Vec<ProviderAccount>,
}

impl StaticPlacement {
    pub fn new(accounts: Vec<ProviderAccount>) -> Self {
        Self { accounts }
    }

    /// Select the account and location for a resource.
    ///
    /// Selection criteria (in order):
    /// 1. Account must admit the tenant
    /// 2. Account must match the `provider` and `account` hints (if given)
    /// 3. Account must offer the `location` hint (if given), otherwise its
    ///    first location is used
    pub fn select(&self, tenant_id: &str, hints: &Properties) -> Result<Placement> {
        let provider = hints.get(HINT_PROVIDER);
        let account = hints.get(HINT_ACCOUNT);
        let location = hints.get(HINT_LOCATION);

        let candidate = self
            .accounts
            .iter()
            .filter(|a| a.admits(tenant_id))
            .filter(|a| provider.is_none_or(|p| *p == a.provider_type))
            .filter(|a| account.is_none_or(|id| *id == a.id))
            .find_map(|a| {
                let chosen = match location {
                    Some(wanted) => a.locations.iter().find(|l| *l == wanted),
                    None => a.locations.first(),
                }?;
                Some(Placement {
                    account_id: a.id.clone(),
                    provider_type: a.provider_type.clone(),
                    location: chosen.clone(),
                })
            });

        match candidate {
            Some(placement) => {
                debug!(
                    tenant_id = %tenant_id,
                    account_id = %placement.account_id,
                    location = %placement.location,
                    "Placed resource"
                );
                Ok(placement)
            }
            None => Err(CloudError::ProviderUnavailable(describe_miss(
                tenant_id, provider, account, location,
            ))),
        }
    }
}

fn describe_miss(
    tenant_id: &str,
    provider: Option<&String>,
    account: Option<&String>,
    location: Option<&String>,
) -> String {
    let mut msg = format!("no provider account available for tenant {}", tenant_id);
    if let Some(p) = provider {
        msg.push_str(&format!(", provider={}", p));
    }
    if let Some(a) = account {
        msg.push_str(&format!(", account={}", a));
    }
    if let Some(l) = location {
        msg.push_str(&format!(", location={}", l));
    }
    msg
}

#[async_trait]
impl PlacementResolver for StaticPlacement {
    async fn place(&self, tenant_id: &str, hints: &Properties) -> Result<Placement> {
        self.select(tenant_id, hints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> StaticPlacement {
        StaticPlacement::new(vec![
            ProviderAccount::new("private", "mock", &["lab"]).for_tenants(&["acme"]),
            ProviderAccount::new("shared", "mock", &["eu-1", "us-1"]),
            ProviderAccount::new("other", "openstack", &["eu-1"]),
        ])
    }

    fn hints(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_first_admitted_account_wins() {
        let p = placement();
        let acme = p.select("acme", &Properties::new()).unwrap();
        assert_eq!(acme.account_id, "private");
        assert_eq!(acme.location, "lab");

        let other = p.select("globex", &Properties::new()).unwrap();
        assert_eq!(other.account_id, "shared");
        assert_eq!(other.location, "eu-1");
    }

    #[test]
    fn test_hints_narrow_candidates() {
        let p = placement();

        let placed = p
            .select("globex", &hints(&[("location", "us-1")]))
            .unwrap();
        assert_eq!(placed.account_id, "shared");
        assert_eq!(placed.location, "us-1");

        let placed = p
            .select("globex", &hints(&[("provider", "openstack")]))
            .unwrap();
        assert_eq!(placed.account_id, "other");
        assert_eq!(placed.provider_type, "openstack");
    }

    #[test]
    fn test_no_match_is_provider_unavailable() {
        let p = placement();
        assert!(matches!(
            p.select("globex", &hints(&[("account", "private")])),
            Err(CloudError::ProviderUnavailable(_))
        ));
        assert!(matches!(
            p.select("globex", &hints(&[("location", "mars")])),
            Err(CloudError::ProviderUnavailable(_))
        ));
        assert!(matches!(
            StaticPlacement::new(vec![]).select("acme", &Properties::new()),
            Err(CloudError::ProviderUnavailable(_))
        ));
    }

    #[test]
    fn test_parse_account() {
        let account: ProviderAccount = "lab:mock:zone-a, zone-b".parse().unwrap();
        assert_eq!(account.id, "lab");
        assert_eq!(account.provider_type, "mock");
        assert_eq!(account.locations, vec!["zone-a", "zone-b"]);

        assert!("lab:mock".parse::<ProviderAccount>().is_err());
        assert!("lab:mock:".parse::<ProviderAccount>().is_err());
    }
}
