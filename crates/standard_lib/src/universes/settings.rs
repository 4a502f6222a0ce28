use std::sync::Arc;
use chrono::Duration;
use rust_decimal::Decimal;
use crate::market_data::base_data::Resolution;
use crate::securities::initializer::{DefaultSecurityInitializer, SecurityInitializer};

/// Per-universe subscription settings applied to every chain it creates.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSettings {
    pub resolution: Resolution,
    pub fill_forward: bool,
    /// `None` leaves leverage to the security initializer.
    pub leverage: Option<Decimal>,
    pub extended_market_hours: bool,
    /// Minimum time a selected contract stays in the universe.
    pub minimum_time_in_universe: Duration,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::Minutes(1),
            fill_forward: true,
            leverage: None,
            extended_market_hours: false,
            minimum_time_in_universe: Duration::days(1),
        }
    }
}

/// Engine-wide fallbacks for a selection model that was not given its own
/// settings or initializer.
#[derive(Clone)]
pub struct EngineDefaults {
    pub universe_settings: UniverseSettings,
    pub security_initializer: Arc<dyn SecurityInitializer>,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            universe_settings: UniverseSettings::default(),
            security_initializer: Arc::new(DefaultSecurityInitializer),
        }
    }
}
