use std::sync::Arc;
use crate::securities::security::Security;

/// Hook run once on every newly constructed security, before it is
/// registered. Typical uses: leverage, model wiring, seeding caches.
pub trait SecurityInitializer: Send + Sync {
    fn initialize(&self, security: &Security);
}

/// Engine default: leaves the security as constructed.
pub struct DefaultSecurityInitializer;

impl SecurityInitializer for DefaultSecurityInitializer {
    fn initialize(&self, _security: &Security) {}
}

/// Adapts a closure into a [`SecurityInitializer`].
pub struct FuncSecurityInitializer<F>(pub F);

impl<F> SecurityInitializer for FuncSecurityInitializer<F>
where
    F: Fn(&Security) + Send + Sync,
{
    fn initialize(&self, security: &Security) {
        (self.0)(security)
    }
}

/// Shorthand for `Arc::new(FuncSecurityInitializer(f))`.
pub fn initializer_fn<F>(f: F) -> Arc<dyn SecurityInitializer>
where
    F: Fn(&Security) + Send + Sync + 'static,
{
    Arc::new(FuncSecurityInitializer(f))
}
