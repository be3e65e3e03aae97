//! Host capabilities consumed by the dispatcher.

use super::errors::HandlerResult;

/// State owned by the host application and mutated by handlers.
///
/// The dispatcher only ever touches the host from the thread that drives the
/// command server tick, so implementations need no internal locking.
pub trait Host {
    /// Runs `operation` with the host's active viewport and selection context
    /// entered.
    ///
    /// Handlers registered with [`super::ContextRequirement::Active`] are
    /// invoked through this hook. The default implementation runs the
    /// operation directly.
    fn with_active_context(
        &mut self,
        command: &str,
        operation: &mut dyn FnMut(&mut Self) -> HandlerResult,
    ) -> HandlerResult {
        let _ = command;
        operation(self)
    }
}
