use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use crate::engine_core::api_traits::SecurityService;
use crate::engine_core::clock::SimClock;
use crate::engine_core::public_classes::StrategyMode;
use crate::engine_core::security_service::default_security_service;
use crate::engine_core::selection_context::SelectionContext;
use crate::engine_core::subscriptions::InMemorySubscriptionManager;
use crate::securities::initializer::SecurityInitializer;
use crate::securities::market_hours::MarketHoursDatabase;
use crate::securities::registry::{RegistryEvent, SecurityRegistry};
use crate::securities::symbol_properties::SymbolPropertiesDatabase;
use crate::securities::symbols::Currency;
use crate::universes::settings::{EngineDefaults, UniverseSettings};

/// The **engine context** is the root container for all shared runtime
/// services and clocks. It owns:
///
/// - [`SecurityRegistry`]: canonical store of chain securities.
/// - Metadata databases: exchange hours and symbol properties.
/// - [`InMemorySubscriptionManager`]: deduped data subscriptions.
/// - The security construction service.
/// - Engine-wide defaults for universe settings and the security initializer.
/// - **Clock**: wall clock in live mode, [`SimClock`] in backtests.
///
/// Selection models never see `EngineCtx`; they get a [`SelectionContext`]
/// built per refresh by [`EngineCtx::selection_context`], which snapshots
/// the defaults as they are at that moment.
///
/// ### Example
/// ```ignore
/// let ctx = EngineCtx::backtest(hours_db, props_db, Currency::USD, start);
/// ctx.set_default_universe_settings(UniverseSettings { resolution: Resolution::Hours(1), ..Default::default() });
/// let sel = ctx.selection_context();
/// ```
#[derive(Clone)]
pub struct EngineCtx {
    /// Canonical security registry.
    pub registry: Arc<SecurityRegistry>,

    pub market_hours: Arc<MarketHoursDatabase>,
    pub symbol_properties: Arc<SymbolPropertiesDatabase>,

    /// Deduped data subscriptions of every security created through this context.
    pub subscriptions: Arc<InMemorySubscriptionManager>,

    pub security_service: Arc<dyn SecurityService>,

    defaults: Arc<RwLock<EngineDefaults>>,

    pub account_currency: Currency,
    pub mode: StrategyMode,

    /// Controllable clock for simulations/backtests.
    pub sim_clock: Arc<SimClock>,
}

impl EngineCtx {
    fn build(
        market_hours: MarketHoursDatabase,
        symbol_properties: SymbolPropertiesDatabase,
        account_currency: Currency,
        mode: StrategyMode,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            registry: Arc::new(SecurityRegistry::new()),
            market_hours: Arc::new(market_hours),
            symbol_properties: Arc::new(symbol_properties),
            subscriptions: Arc::new(InMemorySubscriptionManager::new()),
            security_service: default_security_service(),
            defaults: Arc::new(RwLock::new(EngineDefaults::default())),
            account_currency,
            mode,
            sim_clock: Arc::new(SimClock::new(start)),
        }
    }

    /// Live context; `now()` follows the wall clock.
    pub fn live(
        market_hours: MarketHoursDatabase,
        symbol_properties: SymbolPropertiesDatabase,
        account_currency: Currency,
    ) -> Self {
        // sim clock seeded for tools/tests
        Self::build(market_hours, symbol_properties, account_currency, StrategyMode::Live, Utc::now())
    }

    /// Backtest context; `now()` follows the sim clock starting at `start`.
    pub fn backtest(
        market_hours: MarketHoursDatabase,
        symbol_properties: SymbolPropertiesDatabase,
        account_currency: Currency,
        start: DateTime<Utc>,
    ) -> Self {
        Self::build(market_hours, symbol_properties, account_currency, StrategyMode::Backtest, start)
    }

    /// Swap the security construction service.
    pub fn with_security_service(mut self, service: Arc<dyn SecurityService>) -> Self {
        self.security_service = service;
        self
    }

    /// Current time for this context's mode.
    pub fn now(&self) -> DateTime<Utc> {
        match self.mode {
            StrategyMode::Live => Utc::now(),
            StrategyMode::Backtest => self.sim_clock.now(),
        }
    }

    pub fn defaults(&self) -> EngineDefaults {
        self.defaults.read().clone()
    }

    /// Applies from the next refresh on, to models without their own settings.
    pub fn set_default_universe_settings(&self, settings: UniverseSettings) {
        self.defaults.write().universe_settings = settings;
    }

    /// Applies from the next refresh on, to models without their own initializer.
    pub fn set_default_security_initializer(&self, initializer: Arc<dyn SecurityInitializer>) {
        self.defaults.write().security_initializer = initializer;
    }

    /// Per-refresh view at [`EngineCtx::now`].
    pub fn selection_context(&self) -> SelectionContext {
        self.selection_context_at(self.now())
    }

    pub fn selection_context_at(&self, utc_time: DateTime<Utc>) -> SelectionContext {
        SelectionContext {
            utc_time,
            registry: self.registry.clone(),
            market_hours: self.market_hours.clone(),
            symbol_properties: self.symbol_properties.clone(),
            security_service: self.security_service.clone(),
            subscription_manager: self.subscriptions.clone(),
            defaults: self.defaults(),
            account_currency: self.account_currency,
            live_mode: self.mode.is_live(),
        }
    }

    /// Subscribe to registry change events (add/remove).
    pub fn registry_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.registry.subscribe()
    }
}
