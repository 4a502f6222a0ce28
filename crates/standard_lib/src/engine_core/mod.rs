pub mod api_traits;
pub mod clock;
pub mod engine_ctx;
pub mod public_classes;
pub mod security_service;
pub mod selection_context;
pub mod selection_manager;
pub mod subscriptions;
