pub mod errors;
pub mod filter;
pub mod future_selection;
pub mod futures_chain;
pub mod models;
pub mod settings;

#[cfg(test)]
mod tests;
