//! What the game server provides to this layer.
//!
//! The server owns the resource stack and the entity world; addonsync only
//! reads them and asks for resends through these traits.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use addonsync_pack::PackSource;
use addonsync_types::{ContentId, EntityTypeId, RuntimeId};

/// The server's resource pack stack.
pub trait ResourcePackManager: Send + Sync {
    fn resource_stack(&self) -> Vec<Arc<dyn PackSource>>;

    fn set_resource_stack(&self, stack: Vec<Arc<dyn PackSource>>);

    fn set_encryption_key(&self, pack_id: ContentId, key: &[u8; 32]);
}

/// The server's view of spawned entities.
pub trait EntityDirectory: Send + Sync {
    fn entity_type_of(&self, runtime_id: RuntimeId) -> Option<EntityTypeId>;

    /// Entities of `entity_type` currently shown to `viewer`, including the
    /// viewer itself when it matches.
    fn entities_visible_to(&self, viewer: RuntimeId, entity_type: &EntityTypeId) -> Vec<RuntimeId>;

    /// Sends the entity's data packet again, to one player or to everyone
    /// viewing it when `recipient` is `None`.
    fn resend_actor_data(&self, runtime_id: RuntimeId, recipient: Option<RuntimeId>);
}

/// A resource stack held in memory. Used by tools that load packages
/// without a running server.
#[derive(Default)]
pub struct InMemoryPackManager {
    stack: RwLock<Vec<Arc<dyn PackSource>>>,
    keys: Mutex<Vec<(ContentId, [u8; 32])>>,
}

impl InMemoryPackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing stack.
    pub fn with_stack(stack: Vec<Arc<dyn PackSource>>) -> Self {
        Self {
            stack: RwLock::new(stack),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// Keys handed over so far, in call order.
    pub fn keys(&self) -> Vec<(ContentId, [u8; 32])> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn stack_ids(&self) -> Vec<ContentId> {
        self.stack
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.pack_id())
            .collect()
    }
}

impl ResourcePackManager for InMemoryPackManager {
    fn resource_stack(&self) -> Vec<Arc<dyn PackSource>> {
        self.stack.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_resource_stack(&self, stack: Vec<Arc<dyn PackSource>>) {
        *self.stack.write().unwrap_or_else(PoisonError::into_inner) = stack;
    }

    fn set_encryption_key(&self, pack_id: ContentId, key: &[u8; 32]) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pack_id, *key));
    }
}
