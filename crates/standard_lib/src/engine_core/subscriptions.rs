//! Subscription bookkeeping.
//!
//! [`InMemorySubscriptionManager`] is the engine's table of data
//! subscriptions. Identical requests (same symbol and resolution) share one
//! entry, so re-creating a chain never doubles its feed.

use std::sync::Arc;
use dashmap::DashMap;
use crate::engine_core::api_traits::SubscriptionManager;
use crate::engine_core::public_classes::SubscriptionDataConfig;
use crate::market_data::base_data::Resolution;
use crate::securities::symbols::Symbol;

/// Identity of a subscription in the dedup table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SubKey {
    symbol: Symbol,
    resolution: Resolution,
}

impl SubKey {
    fn of(config: &SubscriptionDataConfig) -> Self {
        Self { symbol: config.symbol.clone(), resolution: config.resolution }
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionManager {
    active: DashMap<SubKey, Arc<SubscriptionDataConfig>>,
}

impl InMemorySubscriptionManager {
    pub fn new() -> Self { Self::default() }
}

impl SubscriptionManager for InMemorySubscriptionManager {
    fn add(&self, config: SubscriptionDataConfig) -> Arc<SubscriptionDataConfig> {
        let key = SubKey::of(&config);
        self.active
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(symbol=%config.symbol, resolution=%config.resolution, "subscription added");
                Arc::new(config)
            })
            .clone()
    }

    fn configs_for(&self, symbol: &Symbol) -> Vec<Arc<SubscriptionDataConfig>> {
        self.active
            .iter()
            .filter(|kv| &kv.key().symbol == symbol)
            .map(|kv| kv.value().clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.active.len()
    }
}
