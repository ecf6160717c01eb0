//! Fault handler registry
//!
//! Handlers are kept per kind, per priority, in registration order.
//! Registrations accumulate for the lifetime of the registry; there is no
//! removal. Registering the same handler twice registers it twice.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::handler::{FaultHandler, HandlerId};
use super::types::FaultKind;

/// One registered handler as seen by dispatch.
#[derive(Clone)]
pub struct RegisteredHandler {
    /// Registration id
    pub id: HandlerId,
    /// Priority it was registered at
    pub priority: i32,
    /// The handler
    pub handler: Arc<dyn FaultHandler>,
}

impl std::fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Handlers by kind and priority.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<FaultKind, BTreeMap<i32, Vec<RegisteredHandler>>>,
    next_id: u64,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` at `priority` for every kind in `kinds`.
    ///
    /// One id covers all the kinds of one call.
    pub fn register(
        &mut self,
        priority: i32,
        handler: Arc<dyn FaultHandler>,
        kinds: &[FaultKind],
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        for kind in kinds {
            self.handlers
                .entry(*kind)
                .or_default()
                .entry(priority)
                .or_default()
                .push(RegisteredHandler {
                    id,
                    priority,
                    handler: Arc::clone(&handler),
                });
        }
        id
    }

    /// Whether anything is registered directly under `kind`.
    pub fn has_handlers(&self, kind: FaultKind) -> bool {
        self.handlers
            .get(&kind)
            .map(|by_priority| by_priority.values().any(|list| !list.is_empty()))
            .unwrap_or(false)
    }

    /// Handlers that should see faults of `kind`, in ascending priority and
    /// registration order within a priority.
    ///
    /// Falls back to the `Unknown` registrations when nothing is registered
    /// for `kind`. Returns `None` when neither has any handler.
    pub fn handlers_for(&self, kind: FaultKind) -> Option<Vec<RegisteredHandler>> {
        let resolved = if self.has_handlers(kind) {
            kind
        } else if self.has_handlers(FaultKind::Unknown) {
            FaultKind::Unknown
        } else {
            return None;
        };

        self.handlers
            .get(&resolved)
            .map(|by_priority| by_priority.values().flatten().cloned().collect())
    }

    /// Whether `id` was issued by this registry.
    pub fn contains(&self, id: HandlerId) -> bool {
        id.0 < self.next_id
    }

    /// Number of registrations (calls to `register`).
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::errors::HandlerResult;
    use crate::fault::handler::FaultBatch;

    struct Named(&'static str);

    impl FaultHandler for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn fault_occurred(&self, _batch: &FaultBatch<'_>) -> HandlerResult<()> {
            Ok(())
        }
    }

    fn names(handlers: &[RegisteredHandler]) -> Vec<String> {
        handlers.iter().map(|h| h.handler.name().to_string()).collect()
    }

    #[test]
    fn test_priority_then_registration_order() {
        let mut registry = HandlerRegistry::new();
        registry.register(5, Arc::new(Named("first-5")), &[FaultKind::NodeFailure]);
        registry.register(1, Arc::new(Named("only-1")), &[FaultKind::NodeFailure]);
        registry.register(5, Arc::new(Named("second-5")), &[FaultKind::NodeFailure]);

        let handlers = registry.handlers_for(FaultKind::NodeFailure).unwrap();
        assert_eq!(names(&handlers), ["only-1", "first-5", "second-5"]);
    }

    #[test]
    fn test_falls_back_to_unknown() {
        let mut registry = HandlerRegistry::new();
        registry.register(1, Arc::new(Named("catch-all")), &[FaultKind::Unknown]);

        let handlers = registry.handlers_for(FaultKind::SiteFailure).unwrap();
        assert_eq!(names(&handlers), ["catch-all"]);
    }

    #[test]
    fn test_specific_registration_shadows_unknown() {
        let mut registry = HandlerRegistry::new();
        registry.register(1, Arc::new(Named("catch-all")), &[FaultKind::Unknown]);
        registry.register(1, Arc::new(Named("sites")), &[FaultKind::SiteFailure]);

        let handlers = registry.handlers_for(FaultKind::SiteFailure).unwrap();
        assert_eq!(names(&handlers), ["sites"]);
    }

    #[test]
    fn test_nothing_registered() {
        let registry = HandlerRegistry::new();
        assert!(registry.handlers_for(FaultKind::NodeFailure).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_one_id_for_multiple_kinds() {
        let mut registry = HandlerRegistry::new();
        let id = registry.register(
            1,
            Arc::new(Named("both")),
            &[FaultKind::NodeFailure, FaultKind::ClusterPartition],
        );

        let node = registry.handlers_for(FaultKind::NodeFailure).unwrap();
        let partition = registry.handlers_for(FaultKind::ClusterPartition).unwrap();
        assert_eq!(node[0].id, id);
        assert_eq!(partition[0].id, id);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_kept() {
        let mut registry = HandlerRegistry::new();
        let handler: Arc<dyn FaultHandler> = Arc::new(Named("twice"));
        let a = registry.register(1, Arc::clone(&handler), &[FaultKind::NodeFailure]);
        let b = registry.register(1, handler, &[FaultKind::NodeFailure]);

        assert_ne!(a, b);
        assert_eq!(registry.handlers_for(FaultKind::NodeFailure).unwrap().len(), 2);
    }
}
