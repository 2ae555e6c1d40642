//! Registry instrumentation.
//!
//! All counters flow through `MetricsEvent`; registry code never touches the
//! atomics directly.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

///
/// LookupTier
/// Which discriminator resolution tier produced a hit.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LookupTier {
    Indexed,
    QualifiedName,
    SearchPackage,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ModelBuilt,
    ModelRegistered,
    CacheHit,
    DuplicateRegistration,
    Lookup(LookupTier),
    LookupMiss,
}

///
/// RegistryMetrics
/// Ephemeral, in-memory counters for one mapper.
///

#[derive(Debug, Default)]
pub struct RegistryMetrics {
    models_built: AtomicU64,
    models_registered: AtomicU64,
    cache_hits: AtomicU64,
    duplicate_registrations: AtomicU64,
    lookup_indexed: AtomicU64,
    lookup_qualified_name: AtomicU64,
    lookup_search_package: AtomicU64,
    lookup_misses: AtomicU64,
}

impl RegistryMetrics {
    pub(crate) fn record(&self, event: MetricsEvent) {
        let counter = match event {
            MetricsEvent::ModelBuilt => &self.models_built,
            MetricsEvent::ModelRegistered => &self.models_registered,
            MetricsEvent::CacheHit => &self.cache_hits,
            MetricsEvent::DuplicateRegistration => &self.duplicate_registrations,
            MetricsEvent::Lookup(LookupTier::Indexed) => &self.lookup_indexed,
            MetricsEvent::Lookup(LookupTier::QualifiedName) => &self.lookup_qualified_name,
            MetricsEvent::Lookup(LookupTier::SearchPackage) => &self.lookup_search_package,
            MetricsEvent::LookupMiss => &self.lookup_misses,
        };

        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let get = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        MetricsSnapshot {
            models_built: get(&self.models_built),
            models_registered: get(&self.models_registered),
            cache_hits: get(&self.cache_hits),
            duplicate_registrations: get(&self.duplicate_registrations),
            lookup_indexed: get(&self.lookup_indexed),
            lookup_qualified_name: get(&self.lookup_qualified_name),
            lookup_search_package: get(&self.lookup_search_package),
            lookup_misses: get(&self.lookup_misses),
        }
    }
}

///
/// MetricsSnapshot
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub models_built: u64,
    pub models_registered: u64,
    pub cache_hits: u64,
    pub duplicate_registrations: u64,
    pub lookup_indexed: u64,
    pub lookup_qualified_name: u64,
    pub lookup_search_package: u64,
    pub lookup_misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_increment_their_own_counter() {
        let metrics = RegistryMetrics::default();
        metrics.record(MetricsEvent::CacheHit);
        metrics.record(MetricsEvent::CacheHit);
        metrics.record(MetricsEvent::Lookup(LookupTier::SearchPackage));

        let snap = metrics.snapshot();
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.lookup_search_package, 1);
        assert_eq!(snap.lookup_indexed, 0);
    }
}
