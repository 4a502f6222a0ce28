pub mod futures_helpers;
pub mod initializer;
pub mod market_hours;
pub mod registry;
pub mod security;
pub mod symbol_properties;
pub mod symbols;
