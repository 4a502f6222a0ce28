use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::engine_core::api_traits::{
    MarketHoursProvider, SecurityService, SecurityStore, SubscriptionManager, SymbolPropertiesProvider,
};
use crate::securities::symbols::Currency;
use crate::universes::settings::EngineDefaults;

/// Everything a selection model may consult during one refresh.
///
/// Built fresh per refresh (see `EngineCtx::selection_context`), so
/// `defaults` reflects the engine defaults at that moment.
#[derive(Clone)]
pub struct SelectionContext {
    pub utc_time: DateTime<Utc>,
    pub registry: Arc<dyn SecurityStore>,
    pub market_hours: Arc<dyn MarketHoursProvider>,
    pub symbol_properties: Arc<dyn SymbolPropertiesProvider>,
    pub security_service: Arc<dyn SecurityService>,
    pub subscription_manager: Arc<dyn SubscriptionManager>,
    pub defaults: EngineDefaults,
    pub account_currency: Currency,
    pub live_mode: bool,
}
