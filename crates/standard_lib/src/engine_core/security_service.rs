use std::sync::Arc;
use crate::engine_core::api_traits::{SecurityRequest, SecurityService, SubscriptionManager};
use crate::engine_core::public_classes::SubscriptionDataConfig;
use crate::securities::security::Security;

/// Engine default [`SecurityService`]: builds securities purely from the
/// request, with no provider calls.
#[derive(Default)]
pub struct DefaultSecurityService;

impl SecurityService for DefaultSecurityService {
    fn create_security(
        &self,
        request: SecurityRequest,
        subscriptions: &dyn SubscriptionManager,
    ) -> anyhow::Result<Security> {
        let SecurityRequest {
            symbol,
            hours,
            properties,
            initializer,
            resolution,
            fill_forward,
            leverage,
            extended_market_hours,
            is_internal_feed,
            is_custom_data,
            is_live_mode,
            is_filtered_subscription,
        } = request;

        if properties.pricing.lot_size.is_sign_negative() || properties.pricing.lot_size.is_zero() {
            anyhow::bail!("invalid lot size {} for {}", properties.pricing.lot_size, symbol);
        }

        // 1) subscription (deduped by the manager)
        let config = subscriptions.add(SubscriptionDataConfig {
            symbol: symbol.clone(),
            resolution,
            increment: resolution.as_duration(),
            data_time_zone: hours.data_time_zone,
            exchange_time_zone: hours.exchange_hours.tz,
            fill_forward,
            extended_market_hours,
            is_internal_feed,
            is_custom_data,
            is_filtered_subscription,
        });

        // 2) assemble
        let security = Security::new(symbol, properties, hours.exchange_hours, hours.data_time_zone, config);

        // 3) initializer first, explicit leverage wins
        initializer.initialize(&security);
        if let Some(lev) = leverage {
            security.set_leverage(lev);
        }

        tracing::debug!(symbol=%security.symbol, live=is_live_mode, resolution=%resolution, "security constructed");
        Ok(security)
    }
}

/// Shared handle to the default service.
pub fn default_security_service() -> Arc<dyn SecurityService> {
    Arc::new(DefaultSecurityService)
}
