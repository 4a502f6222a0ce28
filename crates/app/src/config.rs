use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, Utc};
use standard_lib::engine_core::public_classes::StrategyMode;
use standard_lib::securities::symbols::{Currency, Exchange, SecurityType, Symbol};

/// Binary settings, read from the environment (a `.env` file is honoured).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Canonical chains to keep in the universe.
    pub chains: Vec<Symbol>,
    pub refresh_interval: Duration,
    pub mode: StrategyMode,
    pub backtest_start: DateTime<Utc>,
    pub backtest_days: i64,
    /// `backtest_start` plus `backtest_days`.
    pub backtest_end: DateTime<Utc>,
    pub account_currency: Currency,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let market_raw = get("CHAIN_MARKET", "NYMEX");
        let default_market: Exchange = market_raw.parse().context("CHAIN_MARKET")?;
        let chains = parse_chains(&get("CHAIN_ROOTS", "CL,ES@CME"), default_market).context("CHAIN_ROOTS")?;

        let mins: i64 = get("REFRESH_INTERVAL_MINS", "1440")
            .trim()
            .parse()
            .context("REFRESH_INTERVAL_MINS")?;
        if mins <= 0 {
            return Err(anyhow!("must be positive, got {mins}")).context("REFRESH_INTERVAL_MINS");
        }
        let refresh_interval = Duration::try_minutes(mins)
            .ok_or_else(|| anyhow!("{mins} minutes is out of range"))
            .context("REFRESH_INTERVAL_MINS")?;

        let mode = match get("CHAIN_MODE", "backtest").trim().to_ascii_lowercase().as_str() {
            "backtest" => StrategyMode::Backtest,
            "live" => StrategyMode::Live,
            other => return Err(anyhow!("expected backtest or live, got {other:?}")).context("CHAIN_MODE"),
        };

        let backtest_start = DateTime::parse_from_rfc3339(get("BACKTEST_START", "2024-01-02T00:00:00Z").trim())
            .context("BACKTEST_START")?
            .with_timezone(&Utc);
        let backtest_days: i64 = get("BACKTEST_DAYS", "5").trim().parse().context("BACKTEST_DAYS")?;
        if backtest_days <= 0 {
            return Err(anyhow!("must be positive, got {backtest_days}")).context("BACKTEST_DAYS");
        }
        let backtest_end = Duration::try_days(backtest_days)
            .and_then(|span| backtest_start.checked_add_signed(span))
            .ok_or_else(|| anyhow!("{backtest_days} days past {backtest_start} is out of range"))
            .context("BACKTEST_DAYS")?;

        let account_currency: Currency = get("ACCOUNT_CURRENCY", "USD").parse().context("ACCOUNT_CURRENCY")?;

        Ok(Self {
            chains,
            refresh_interval,
            mode,
            backtest_start,
            backtest_days,
            backtest_end,
            account_currency,
        })
    }
}

/// `"CL,NG,ES@CME"` -> canonical futures chains; entries without `@` use `default_market`.
fn parse_chains(raw: &str, default_market: Exchange) -> anyhow::Result<Vec<Symbol>> {
    let mut out = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (root, market) = match item.split_once('@') {
            Some((root, m)) => {
                let market: Exchange = m.parse().with_context(|| format!("in {item:?}"))?;
                (root.trim(), market)
            }
            None => (item, default_market),
        };
        out.push(Symbol::create_canonical(root.to_ascii_uppercase(), SecurityType::Future, market));
    }
    if out.is_empty() {
        return Err(anyhow!("no chains configured"));
    }
    Ok(out)
}
