//! Registry mapping command types to handlers.
//!
//! The table is assembled once by [`HandlerTableBuilder`] before the command
//! server starts and is read-only afterwards. Optional feature sets are added
//! at build time with [`HandlerTableBuilder::extend_if`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::builtin;
use super::errors::HandlerError;
use super::handler::{CommandHandler, Typed};
use super::DISPATCH_TARGET;

/// Whether a handler must run inside the host's active context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextRequirement {
    /// Runs directly against the host.
    #[default]
    Any,
    /// Runs through [`super::Host::with_active_context`].
    Active,
}

/// A handler plus the context it needs.
pub(crate) struct Registration<H> {
    pub(crate) handler: Box<dyn CommandHandler<H>>,
    pub(crate) context: ContextRequirement,
}

/// Immutable mapping from command type to handler.
pub struct HandlerTable<H> {
    handlers: HashMap<String, Registration<H>>,
}

impl<H: 'static> HandlerTable<H> {
    /// Starts a builder preloaded with the built-in commands.
    #[must_use]
    pub fn builder() -> HandlerTableBuilder<H> {
        builtin::install(HandlerTableBuilder {
            handlers: HashMap::new(),
        })
    }
}

impl<H> HandlerTable<H> {
    pub(crate) fn get(&self, kind: &str) -> Option<&Registration<H>> {
        self.handlers.get(kind)
    }

    /// Returns true when a handler is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered command types in lexical order.
    #[must_use]
    pub fn command_types(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of registered command types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H> fmt::Debug for HandlerTable<H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HandlerTable")
            .field("commands", &self.command_types())
            .finish()
    }
}

/// Builder for [`HandlerTable`].
pub struct HandlerTableBuilder<H> {
    handlers: HashMap<String, Registration<H>>,
}

impl<H: 'static> HandlerTableBuilder<H> {
    /// Registers a typed handler.
    ///
    /// Parameters are deserialised into `P` (use `#[serde(deny_unknown_fields)]`
    /// to reject unexpected keys) and the result is serialised from `R`.
    #[must_use]
    pub fn register<P, R, F>(self, kind: &str, context: ContextRequirement, handler: F) -> Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(&mut H, P) -> Result<R, HandlerError> + 'static,
    {
        self.register_handler(kind, context, Typed::new(handler))
    }

    /// Registers any [`CommandHandler`] implementation.
    ///
    /// Registering the same type twice replaces the earlier handler.
    #[must_use]
    pub fn register_handler(
        mut self,
        kind: &str,
        context: ContextRequirement,
        handler: impl CommandHandler<H> + 'static,
    ) -> Self {
        let registration = Registration {
            handler: Box::new(handler),
            context,
        };
        if self
            .handlers
            .insert(kind.to_owned(), registration)
            .is_some()
        {
            warn!(
                target: DISPATCH_TARGET,
                command = kind,
                "replaced existing handler registration"
            );
        }
        self
    }

    /// Applies `group` only when `enabled` is true.
    #[must_use]
    pub fn extend_if(self, enabled: bool, group: impl FnOnce(Self) -> Self) -> Self {
        if enabled { group(self) } else { self }
    }

    /// Freezes the registrations.
    ///
    /// The `list_commands` built-in is registered last so it reports every
    /// command, including itself.
    #[must_use]
    pub fn build(self) -> HandlerTable<H> {
        let mut kinds: Vec<String> = self.handlers.keys().cloned().collect();
        kinds.push(builtin::LIST_COMMANDS.to_owned());
        kinds.sort_unstable();
        kinds.dedup();
        let builder = builtin::install_listing(self, kinds);
        HandlerTable {
            handlers: builder.handlers,
        }
    }
}
