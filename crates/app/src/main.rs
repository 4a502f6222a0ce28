use chrono::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use chain_refresh::config::AppConfig;
use chain_refresh::user_selectors::front_month::{contract_specs, front_month_model, monthly_listing};
use standard_lib::engine_core::api_traits::SubscriptionManager;
use standard_lib::engine_core::engine_ctx::EngineCtx;
use standard_lib::engine_core::public_classes::StrategyMode;
use standard_lib::engine_core::selection_manager::SelectionManager;
use standard_lib::securities::market_hours::MarketHoursDatabase;
use standard_lib::securities::registry::RegistryEvent;
use standard_lib::securities::symbols::Symbol;

const LISTED_MONTHS: u32 = 6;
const FRONT_WINDOW_DAYS: i64 = 90;

/// ------------------------------
/// main: build context + drive refreshes
/// ------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let roots: Vec<String> = cfg.chains.iter().map(|c| format!("{}@{}", c.alias(), c.market)).collect();
    tracing::info!(chains=?roots, mode=?cfg.mode, interval_mins=cfg.refresh_interval.num_minutes(), "starting chain refresh");

    // 1) Engine context for the configured mode
    let hours = MarketHoursDatabase::with_exchange_defaults();
    let ctx = match cfg.mode {
        StrategyMode::Live => EngineCtx::live(hours, contract_specs(), cfg.account_currency),
        StrategyMode::Backtest => EngineCtx::backtest(hours, contract_specs(), cfg.account_currency, cfg.backtest_start),
    };

    // 2) Registry watcher
    let mut events = ctx.registry_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(RegistryEvent::Added(symbol)) => tracing::debug!(symbol=%symbol, "registry: security added"),
                Ok(RegistryEvent::Removed(symbol)) => tracing::debug!(symbol=%symbol, "registry: security removed"),
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped=n, "registry watcher lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 3) Selection
    let mut manager = SelectionManager::new(ctx.clone());
    manager.add_model(Box::new(front_month_model(&cfg.chains, cfg.refresh_interval, FRONT_WINDOW_DAYS)));

    // 4) Drive on the context clock
    match cfg.mode {
        StrategyMode::Backtest => {
            while ctx.now() < cfg.backtest_end {
                cycle(&mut manager);
                ctx.sim_clock.advance(Duration::hours(1));
            }
            tracing::info!(chains=manager.universes().len(), securities=ctx.registry.len(), subscriptions=ctx.subscriptions.len(), "backtest finished");
        }
        StrategyMode::Live => {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tick.tick().await;
                cycle(&mut manager);
            }
        }
    }
    Ok(())
}

/// One host tick: refresh due models, then re-run each chain's contract filter.
fn cycle(manager: &mut SelectionManager) {
    manager.step();
    let now = manager.ctx().now();
    let chains: Vec<Symbol> = manager.universes().chains().cloned().collect();
    for chain in chains {
        let Some(universe) = manager.universes().get(&chain) else { continue };
        let listed = monthly_listing(&chain, universe.security().hours.local_date(now), LISTED_MONTHS);
        let Some(diff) = manager.on_chain_contracts(&chain, &listed) else { continue };
        for contract in &diff.added {
            tracing::info!(chain=%chain, contract=%contract, utc_time=%now, "contract selected");
        }
        for contract in &diff.removed {
            tracing::info!(chain=%chain, contract=%contract, utc_time=%now, "contract deselected");
        }
    }
}
