//! Backend registry.
//!
//! # Responsibilities
//! - Own the configured backend list (fixed at startup)
//! - Own the current healthy subset and its selection cursor
//! - Wait-free snapshot reads, atomic wholesale replacement
//!
//! # Design Decisions
//! - The cursor lives inside each `HealthySet`, so installing a new set
//!   resets it in the same swap
//! - Sets are never patched in place
//! - Change detection ignores ordering

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::BackendConfig;
use crate::load_balancer::backend::Backend;

/// An immutable ordered subset of configured backends plus its round-robin cursor.
#[derive(Debug, Default)]
pub struct HealthySet {
    backends: Vec<Arc<Backend>>,
    cursor: AtomicUsize,
}

impl HealthySet {
    fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Current cursor position (before wrapping).
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Atomically read and advance the cursor.
    pub fn advance(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed)
    }

    /// True if `other` has the same members, in any order.
    pub fn same_members(&self, other: &[Arc<Backend>]) -> bool {
        url_set(&self.backends) == url_set(other)
    }
}

fn url_set(backends: &[Arc<Backend>]) -> HashSet<&str> {
    backends.iter().map(|b| b.url.as_str()).collect()
}

/// Owns configured backends and the current healthy subset.
#[derive(Debug)]
pub struct BackendRegistry {
    configured: Vec<Arc<Backend>>,
    healthy: ArcSwap<HealthySet>,
    generation: AtomicU64,
}

impl BackendRegistry {
    /// Create a registry with an empty healthy set.
    pub fn new(backends: Vec<Backend>) -> Self {
        Self {
            configured: backends.into_iter().map(Arc::new).collect(),
            healthy: ArcSwap::from_pointee(HealthySet::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Build the registry from configuration, preserving order.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, url::ParseError> {
        let mut backends = Vec::with_capacity(configs.len());
        for config in configs {
            let mut backend = Backend::parse(&config.url)?;
            if let Some(name) = &config.name {
                backend.name = name.clone();
            }
            backends.push(backend);
        }
        Ok(Self::new(backends))
    }

    /// All configured backends, in configuration order.
    pub fn configured(&self) -> &[Arc<Backend>] {
        &self.configured
    }

    /// The current healthy set. Never blocks on a concurrent replacement.
    pub fn snapshot_healthy(&self) -> Arc<HealthySet> {
        self.healthy.load_full()
    }

    /// Install `backends` as the healthy set and reset the cursor.
    ///
    /// Anything not in the configured list is dropped.
    pub fn replace_healthy(&self, backends: Vec<Arc<Backend>>) {
        let configured = url_set(&self.configured);
        let members: Vec<Arc<Backend>> = backends
            .into_iter()
            .filter(|b| {
                let known = configured.contains(b.url.as_str());
                if !known {
                    tracing::warn!(backend = %b.url, "Ignoring unconfigured backend in healthy set");
                }
                known
            })
            .collect();

        self.healthy.store(Arc::new(HealthySet::new(members)));
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// True if `candidate` differs in membership from the current healthy set.
    pub fn differs_from_healthy(&self, candidate: &[Arc<Backend>]) -> bool {
        !self.healthy.load().same_members(candidate)
    }

    /// Number of replacements performed so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(n: usize) -> BackendRegistry {
        let backends = (0..n)
            .map(|i| Backend::parse(&format!("http://127.0.0.1:{}", 8000 + i)).unwrap())
            .collect();
        BackendRegistry::new(backends)
    }

    #[test]
    fn test_starts_empty() {
        let reg = registry(3);
        assert_eq!(reg.configured().len(), 3);
        assert!(reg.snapshot_healthy().is_empty());
        assert_eq!(reg.generation(), 0);
    }

    #[test]
    fn test_replace_resets_cursor() {
        let reg = registry(2);
        reg.replace_healthy(reg.configured().to_vec());
        let first = reg.snapshot_healthy();
        first.advance();
        first.advance();
        first.advance();
        assert_eq!(first.cursor(), 3);

        // Same membership, new instance: cursor starts over.
        reg.replace_healthy(reg.configured().to_vec());
        assert_eq!(reg.snapshot_healthy().cursor(), 0);
        assert_eq!(reg.generation(), 2);

        // The old snapshot is untouched.
        assert_eq!(first.cursor(), 3);
    }

    #[test]
    fn test_unordered_comparison() {
        let reg = registry(3);
        let c = reg.configured();
        reg.replace_healthy(vec![c[0].clone(), c[1].clone()]);

        assert!(!reg.differs_from_healthy(&[c[1].clone(), c[0].clone()]));
        assert!(reg.differs_from_healthy(&[c[0].clone()]));
        assert!(reg.differs_from_healthy(&[c[0].clone(), c[1].clone(), c[2].clone()]));
    }

    #[test]
    fn test_replace_keeps_subset_invariant() {
        let reg = registry(2);
        let stranger = Arc::new(Backend::parse("http://10.0.0.1:9999").unwrap());
        reg.replace_healthy(vec![reg.configured()[1].clone(), stranger]);

        let snapshot = reg.snapshot_healthy();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.backends()[0].url, reg.configured()[1].url);
    }

    #[test]
    fn test_from_config_overrides_name() {
        let configs = vec![
            BackendConfig { url: "http://127.0.0.1:8000".into(), name: Some("gpu-0".into()) },
            BackendConfig { url: "http://127.0.0.1:8001".into(), name: None },
        ];
        let reg = BackendRegistry::from_config(&configs).unwrap();
        assert_eq!(reg.configured()[0].name, "gpu-0");
        assert_eq!(reg.configured()[1].name, "127.0.0.1:8001");

        let bad = vec![BackendConfig { url: "not a url".into(), name: None }];
        assert!(BackendRegistry::from_config(&bad).is_err());
    }
}
