use thiserror::Error;
use crate::engine_core::api_traits::MetadataError;
use crate::securities::symbols::{SecurityType, Symbol};

/// Failures surfaced while turning selected symbols into chain universes.
///
/// Any of these aborts the current refresh; the refresh schedule has
/// already advanced by then.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("universe selection returned {symbol} of kind {actual}, expected {expected}")]
    InvalidSymbolKind { symbol: Symbol, expected: SecurityType, actual: SecurityType },

    #[error(transparent)]
    UnknownMarketMetadata(#[from] MetadataError),

    #[error("security construction failed: {0:#}")]
    Engine(anyhow::Error),
}
