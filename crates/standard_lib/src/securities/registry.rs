use std::sync::Arc;
use ahash::AHashMap;
use dashmap::DashMap;
use tokio::sync::broadcast;
use crate::engine_core::api_traits::SecurityStore;
use crate::securities::security::Security;
use crate::securities::symbols::{Exchange, Symbol};

/// Change notifications emitted by the [`SecurityRegistry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(Symbol),
    Removed(Symbol),
}

/// The **security registry** is the canonical, in-memory catalog of all
/// [`Security`] instruments known to the engine at runtime.
///
/// ### Responsibilities
/// - Stores instruments keyed by [`Symbol`], bucketed per [`Exchange`].
/// - Insert-if-absent: an existing entry is never replaced, so every
///   component holding an `Arc<Security>` keeps seeing the same instance.
/// - Emits [`RegistryEvent`]s on add/remove.
/// - Snapshot queries over all known instruments.
///
/// ### Concurrency
/// - Backed by a [`DashMap`] of exchanges → symbol maps.
/// - Each entry is reference-counted (`Arc<Security>`).
pub struct SecurityRegistry {
    inner: DashMap<Exchange, AHashMap<Symbol, Arc<Security>>>,
    tx: broadcast::Sender<RegistryEvent>,
}

impl Default for SecurityRegistry {
    fn default() -> Self { Self::new() }
}

impl SecurityRegistry {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { inner: DashMap::new(), tx }
    }

    /// Exact-identity lookup; a contract symbol never matches its chain.
    pub fn get(&self, symbol: &Symbol) -> Option<Arc<Security>> {
        self.inner
            .get(&symbol.market)
            .and_then(|map| map.get(symbol).cloned())
    }

    /// Insert `sec` unless its symbol is already registered.
    ///
    /// Returns the stored entry: the new one (and emits
    /// `RegistryEvent::Added`), or the pre-existing one untouched.
    pub fn insert(&self, sec: Security) -> Arc<Security> {
        let symbol = sec.symbol.clone();
        let arc = {
            let mut map = self.inner.entry(sec.exchange).or_default();
            if let Some(existing) = map.get(&symbol) {
                return existing.clone();
            }
            let arc = Arc::new(sec);
            map.insert(symbol.clone(), arc.clone());
            arc
        };
        tracing::debug!(symbol=%symbol, "security registered");
        let _ = self.tx.send(RegistryEvent::Added(symbol));
        arc
    }

    /// Engine shutdown/cleanup path; selection never removes entries.
    pub fn remove(&self, symbol: &Symbol) -> Option<Arc<Security>> {
        let out = self.inner.get_mut(&symbol.market).and_then(|mut map| map.remove(symbol));
        if out.is_some() {
            let _ = self.tx.send(RegistryEvent::Removed(symbol.clone()));
        }
        out
    }

    /// New receiver of events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.tx.subscribe()
    }

    /// Point-in-time snapshot of all [`Security`]s currently in the registry.
    pub fn snapshot(&self) -> Vec<Arc<Security>> {
        let mut all = Vec::new();
        for map in self.inner.iter() {
            all.extend(map.value().values().cloned());
        }
        all
    }

    pub fn len(&self) -> usize {
        self.inner.iter().map(|m| m.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl SecurityStore for SecurityRegistry {
    fn lookup(&self, symbol: &Symbol) -> Option<Arc<Security>> {
        self.get(symbol)
    }

    fn insert(&self, security: Security) -> Arc<Security> {
        SecurityRegistry::insert(self, security)
    }
}
