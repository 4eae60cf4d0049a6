//! Target resolution: operator-entered identifiers to probe addresses.

use async_trait::async_trait;
use common::{Error, Result};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

/// Which address families to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyFilter {
    Both,
    V4Only,
    V6Only,
}

impl FamilyFilter {
    fn wants_v4(self) -> bool {
        !matches!(self, FamilyFilter::V6Only)
    }

    fn wants_v6(self) -> bool {
        !matches!(self, FamilyFilter::V4Only)
    }
}

/// Usable addresses for one entered identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub name: String,
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

/// Name-to-address resolution seam. Invoked once per target before its
/// probes are created, never again.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve one identifier to at most one address per family, or
    /// signal that it is unresolvable.
    async fn resolve(&self, name: &str) -> Result<ResolvedTarget>;
}

/// Resolver backed by the system's name service.
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, name: &str) -> Result<ResolvedTarget> {
        if let Ok(literal) = name.parse::<IpAddr>() {
            let (v4, v6) = match literal {
                IpAddr::V4(a) => (Some(a), None),
                IpAddr::V6(a) => (None, Some(a)),
            };
            return Ok(ResolvedTarget {
                name: name.to_string(),
                v4,
                v6,
            });
        }

        let addrs = tokio::net::lookup_host(format!("{name}:0"))
            .await
            .map_err(|e| Error::resolve(format!("{name}: {e}")))?;

        let mut v4 = None;
        let mut v6 = None;
        for addr in addrs {
            match addr.ip() {
                IpAddr::V4(a) if v4.is_none() => v4 = Some(a),
                // Link-local v6 addresses need a scope id the probe tool
                // cannot derive from the bare address.
                IpAddr::V6(a) if v6.is_none() && !a.is_unicast_link_local() => v6 = Some(a),
                _ => {}
            }
        }

        if v4.is_none() && v6.is_none() {
            return Err(Error::resolve(format!("{name}: no usable address")));
        }
        Ok(ResolvedTarget {
            name: name.to_string(),
            v4,
            v6,
        })
    }
}

/// Resolve all entered identifiers, deduplicating case-insensitively
/// and skipping (with a warning) any that do not resolve. An empty
/// result is a startup error: there is nothing to monitor.
pub async fn resolve_targets(
    resolver: &dyn Resolver,
    names: &[String],
    filter: FamilyFilter,
) -> Result<Vec<ResolvedTarget>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for name in names {
        if !seen.insert(name.to_lowercase()) {
            debug!(name = %name, "duplicate target skipped");
            continue;
        }
        match resolver.resolve(name).await {
            Ok(mut target) => {
                if !filter.wants_v4() {
                    target.v4 = None;
                }
                if !filter.wants_v6() {
                    target.v6 = None;
                }
                if target.v4.is_none() && target.v6.is_none() {
                    warn!(name = %name, "no usable address for requested family, skipping");
                    continue;
                }
                resolved.push(target);
            }
            Err(e) => warn!(name = %name, error = %e, "resolution failed, skipping"),
        }
    }

    if resolved.is_empty() {
        return Err(Error::config("no resolvable targets"));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeResolver;

    #[async_trait]
    impl Resolver for FakeResolver {
        async fn resolve(&self, name: &str) -> Result<ResolvedTarget> {
            match name.to_lowercase().as_str() {
                "alpha.example" => Ok(ResolvedTarget {
                    name: name.to_string(),
                    v4: Some("192.0.2.1".parse().unwrap()),
                    v6: None,
                }),
                "dual.example" => Ok(ResolvedTarget {
                    name: name.to_string(),
                    v4: Some("192.0.2.2".parse().unwrap()),
                    v6: Some("2001:db8::2".parse().unwrap()),
                }),
                _ => Err(Error::resolve(format!("{name}: no usable address"))),
            }
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn unresolvable_name_is_skipped_while_survivors_are_kept() {
        let resolved = resolve_targets(
            &FakeResolver,
            &names(&["bogus.invalid", "alpha.example"]),
            FamilyFilter::Both,
        )
        .await
        .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "alpha.example");
    }

    #[tokio::test]
    async fn all_unresolvable_is_a_startup_error() {
        let result =
            resolve_targets(&FakeResolver, &names(&["bogus.invalid"]), FamilyFilter::Both).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn duplicate_names_deduplicate_case_insensitively() {
        let resolved = resolve_targets(
            &FakeResolver,
            &names(&["Alpha.example", "alpha.EXAMPLE"]),
            FamilyFilter::Both,
        )
        .await
        .unwrap();

        assert_eq!(resolved.len(), 1);
        // Case preserved from the first entry for display.
        assert_eq!(resolved[0].name, "Alpha.example");
    }

    #[tokio::test]
    async fn family_filter_drops_the_other_family() {
        let resolved = resolve_targets(
            &FakeResolver,
            &names(&["dual.example"]),
            FamilyFilter::V6Only,
        )
        .await
        .unwrap();
        assert_eq!(resolved[0].v4, None);
        assert!(resolved[0].v6.is_some());

        // A v4-only host under a v6-only filter leaves nothing to monitor.
        let result = resolve_targets(
            &FakeResolver,
            &names(&["alpha.example"]),
            FamilyFilter::V6Only,
        )
        .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn literal_addresses_bypass_lookup() {
        let v4 = SystemResolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(v4.v4, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(v4.v6, None);

        let v6 = SystemResolver.resolve("::1").await.unwrap();
        assert_eq!(v6.v4, None);
        assert_eq!(v6.v6, Some("::1".parse().unwrap()));
    }
}
