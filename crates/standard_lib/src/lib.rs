pub mod engine_core;
pub mod market_data;
pub mod securities;
pub mod universes;
