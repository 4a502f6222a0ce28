use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::engine_core::api_traits::SubscriptionManager;
use crate::securities::initializer::SecurityInitializer;
use crate::securities::security::Security;
use crate::securities::symbols::Symbol;
use crate::universes::filter::FutureFilterUniverse;
use crate::universes::settings::UniverseSettings;

/// One chain's unit of work for the subscription pipeline: the shared chain
/// security plus the settings and initializer it was resolved with.
#[derive(Clone)]
pub struct FuturesChainUniverse {
    security: Arc<Security>,
    settings: UniverseSettings,
    subscription_manager: Arc<dyn SubscriptionManager>,
    initializer: Arc<dyn SecurityInitializer>,
}

impl FuturesChainUniverse {
    pub fn new(
        security: Arc<Security>,
        settings: UniverseSettings,
        subscription_manager: Arc<dyn SubscriptionManager>,
        initializer: Arc<dyn SecurityInitializer>,
    ) -> Self {
        Self { security, settings, subscription_manager, initializer }
    }

    /// The canonical chain symbol.
    #[inline] pub fn symbol(&self) -> &Symbol { &self.security.symbol }
    #[inline] pub fn security(&self) -> &Arc<Security> { &self.security }
    #[inline] pub fn settings(&self) -> &UniverseSettings { &self.settings }
    #[inline] pub fn subscription_manager(&self) -> &Arc<dyn SubscriptionManager> { &self.subscription_manager }
    #[inline] pub fn initializer(&self) -> &Arc<dyn SecurityInitializer> { &self.initializer }

    /// Run the chain's contract filter over `available` contracts at `utc_time`.
    ///
    /// Only unexpired contracts of this chain (same root, market and kind)
    /// reach the filter. Returns `None` when the filter asked to run only at
    /// market open and the exchange is closed; the caller keeps its previous
    /// selection in that case.
    pub fn select_symbols(&self, utc_time: DateTime<Utc>, available: &[Symbol]) -> Option<Vec<Symbol>> {
        let chain = self.symbol();
        let local_date = self.security.hours.local_date(utc_time);

        let candidates = available
            .iter()
            .filter(|s| s.to_canonical() == *chain)
            .filter(|s| matches!(s.expiry, Some(e) if e >= local_date))
            .cloned();

        let filter = self.security.filter();
        let selected = filter(FutureFilterUniverse::new(candidates, local_date));

        if selected.is_only_at_market_open() && !self.security.hours.is_open(utc_time) {
            tracing::trace!(chain=%chain, "exchange closed, keeping previous contract selection");
            return None;
        }
        Some(selected.into_symbols())
    }
}

impl fmt::Debug for FuturesChainUniverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuturesChainUniverse")
            .field("security", &self.security)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
