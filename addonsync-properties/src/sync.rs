//! Server and per-viewer property values.
//!
//! Server values belong to one live entity and are seen by every viewer.
//! Client values belong to a (viewer, entity type) pair and override the
//! server value for that viewer only.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use addonsync_protocol::packets::{PropertySyncData, SyncActorPropertyPacket};
use addonsync_types::{EntityTypeId, PropertyKind, PropertyValue, RuntimeId};
use tracing::{debug, warn};

use crate::schema::PropertySchemaRegistry;
use crate::slot::PropertySlot;
use crate::PropertyError;

/// Which storage a property access targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The authoritative value of one entity.
    Server(RuntimeId),
    /// The override a viewer sees for every entity of the accessed type.
    Client(RuntimeId),
}

/// Dense values of one entity, indexed by slot index. Only positions of
/// int slots are meaningful in `ints`, likewise for `floats`.
struct EntityValues {
    entity_type: EntityTypeId,
    ints: Vec<i32>,
    floats: Vec<f32>,
}

impl EntityValues {
    fn new(entity_type: EntityTypeId) -> Self {
        Self {
            entity_type,
            ints: Vec::new(),
            floats: Vec::new(),
        }
    }

    /// Extends storage with defaults for slots registered since the last
    /// access. Existing positions are untouched.
    fn grow(&mut self, slots: &[PropertySlot]) {
        for slot in slots.iter().skip(self.ints.len()) {
            let (i, f) = match slot.default {
                PropertyValue::Int(v) => (v, 0.0),
                PropertyValue::Float(v) => (0, v),
            };
            self.ints.push(i);
            self.floats.push(f);
        }
    }

    fn get(&self, slot: &PropertySlot) -> Option<PropertyValue> {
        let i = slot.index as usize;
        match slot.kind {
            PropertyKind::Int => self.ints.get(i).copied().map(PropertyValue::Int),
            PropertyKind::Float => self.floats.get(i).copied().map(PropertyValue::Float),
        }
    }

    fn set(&mut self, slot: &PropertySlot, value: PropertyValue) {
        let i = slot.index as usize;
        match value {
            PropertyValue::Int(v) => self.ints[i] = v,
            PropertyValue::Float(v) => self.floats[i] = v,
        }
    }
}

/// Sparse overrides for one (viewer, entity type) pair.
#[derive(Default)]
struct Overrides {
    ints: Vec<Option<i32>>,
    floats: Vec<Option<f32>>,
}

impl Overrides {
    fn get(&self, slot: &PropertySlot) -> Option<PropertyValue> {
        let i = slot.index as usize;
        match slot.kind {
            PropertyKind::Int => self.ints.get(i).copied().flatten().map(PropertyValue::Int),
            PropertyKind::Float => self.floats.get(i).copied().flatten().map(PropertyValue::Float),
        }
    }

    fn set(&mut self, slot: &PropertySlot, value: PropertyValue) {
        let i = slot.index as usize;
        if self.ints.len() <= i {
            self.ints.resize(i + 1, None);
            self.floats.resize(i + 1, None);
        }
        match value {
            PropertyValue::Int(v) => self.ints[i] = Some(v),
            PropertyValue::Float(v) => self.floats[i] = Some(v),
        }
    }
}

/// Property values of live entities and per-viewer overrides.
pub struct PropertySyncState {
    schema: Arc<PropertySchemaRegistry>,
    server: RwLock<HashMap<RuntimeId, EntityValues>>,
    client: RwLock<HashMap<(RuntimeId, EntityTypeId), Overrides>>,
}

impl PropertySyncState {
    pub fn new(schema: Arc<PropertySchemaRegistry>) -> Self {
        Self {
            schema,
            server: RwLock::new(HashMap::new()),
            client: RwLock::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &Arc<PropertySchemaRegistry> {
        &self.schema
    }

    /// Reads a property. Unknown properties are logged and read as `Int(0)`;
    /// a known property without stored value reads as its default.
    pub fn get(&self, scope: Scope, entity_type: &EntityTypeId, name: &str) -> PropertyValue {
        let Some(slot) = self.schema.resolve(entity_type, name) else {
            warn!(%entity_type, property = name, ?scope, "property not found");
            return PropertyValue::Int(0);
        };

        let stored = match scope {
            Scope::Server(runtime_id) => self
                .server
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&runtime_id)
                .filter(|values| values.entity_type == *entity_type)
                .and_then(|values| values.get(&slot)),
            Scope::Client(viewer) => self
                .client
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&(viewer, entity_type.clone()))
                .and_then(|o| o.get(&slot)),
        };
        stored.unwrap_or(slot.default)
    }

    /// Writes a property. Unknown properties, values of the wrong kind and
    /// values outside the slot bounds are logged and rejected; stored state
    /// is never touched on error.
    pub fn set(
        &self,
        scope: Scope,
        entity_type: &EntityTypeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertySlot, PropertyError> {
        let result = self
            .schema
            .resolve(entity_type, name)
            .ok_or_else(|| PropertyError::UnknownProperty {
                entity_type: entity_type.clone(),
                name: name.to_string(),
            })
            .and_then(|slot| slot.check(value).map(|coerced| (slot, coerced)));
        let (slot, coerced) = match result {
            Ok(ok) => ok,
            Err(e) => {
                warn!(%entity_type, property = name, %value, ?scope, error = %e, "property write rejected");
                return Err(e);
            }
        };

        match scope {
            Scope::Server(runtime_id) => self.schema.with_slots(entity_type, |slots| {
                let mut server = self.server.write().unwrap_or_else(PoisonError::into_inner);
                let values = server
                    .entry(runtime_id)
                    .or_insert_with(|| EntityValues::new(entity_type.clone()));
                if values.entity_type != *entity_type {
                    *values = EntityValues::new(entity_type.clone());
                }
                values.grow(slots);
                values.set(&slot, coerced);
            }),
            Scope::Client(viewer) => {
                let mut client = self.client.write().unwrap_or_else(PoisonError::into_inner);
                client
                    .entry((viewer, entity_type.clone()))
                    .or_default()
                    .set(&slot, coerced);
            }
        }

        debug!(%entity_type, property = name, value = %coerced, ?scope, "property set");
        Ok(slot)
    }

    /// Values to attach to an entity's data packet for `viewer`: the
    /// server value of every slot of the type (or its default), replaced
    /// by the viewer's override where one is set.
    pub fn merged_sync_data(
        &self,
        runtime_id: RuntimeId,
        entity_type: &EntityTypeId,
        viewer: Option<RuntimeId>,
    ) -> PropertySyncData {
        self.schema.with_slots(entity_type, |slots| {
            let mut data = PropertySyncData::default();
            if slots.is_empty() {
                return data;
            }

            let server = self.server.read().unwrap_or_else(PoisonError::into_inner);
            let values = server
                .get(&runtime_id)
                .filter(|values| values.entity_type == *entity_type);
            let client = self.client.read().unwrap_or_else(PoisonError::into_inner);
            let overrides = viewer.and_then(|v| client.get(&(v, entity_type.clone())));

            for slot in slots {
                let value = overrides
                    .and_then(|o| o.get(slot))
                    .or_else(|| values.and_then(|v| v.get(slot)))
                    .unwrap_or(slot.default);
                match value {
                    PropertyValue::Int(v) => {
                        data.int_properties.insert(slot.index, v);
                    }
                    PropertyValue::Float(v) => {
                        data.float_properties.insert(slot.index, v);
                    }
                }
            }
            data
        })
    }

    /// Drops the server values of a removed entity.
    pub fn forget_entity(&self, runtime_id: RuntimeId) -> bool {
        let removed = self
            .server
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&runtime_id)
            .is_some();
        if removed {
            debug!(%runtime_id, "cleared entity properties");
        }
        removed
    }

    /// Drops every override held for a viewer that left.
    pub fn forget_viewer(&self, viewer: RuntimeId) {
        self.client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(v, _), _| *v != viewer);
    }

    pub fn tracked_entities(&self) -> usize {
        self.server.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Cached schema packets, one per entity type with slots.
    pub fn build_schema_packets(&self) -> Vec<Arc<SyncActorPropertyPacket>> {
        self.schema.schema_packets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlotDefinition;
    use pretty_assertions::assert_eq;

    fn golem() -> EntityTypeId {
        EntityTypeId::new("demo:golem").unwrap()
    }

    fn state() -> PropertySyncState {
        let schema = Arc::new(PropertySchemaRegistry::new());
        schema.register(&golem(), SlotDefinition::int("phase", 1, 0, 4)).unwrap();
        schema.register(&golem(), SlotDefinition::float("glow", 0.5, 0.0, 1.0)).unwrap();
        PropertySyncState::new(schema)
    }

    #[test]
    fn defaults_before_any_write() {
        let s = state();
        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "phase"), PropertyValue::Int(1));
        assert_eq!(s.get(Scope::Client(RuntimeId(9)), &golem(), "glow"), PropertyValue::Float(0.5));
        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "nope"), PropertyValue::Int(0));
    }

    #[test]
    fn server_and_client_scopes_are_independent() {
        let s = state();
        s.set(Scope::Server(RuntimeId(1)), &golem(), "phase", PropertyValue::Int(3)).unwrap();
        s.set(Scope::Client(RuntimeId(9)), &golem(), "phase", PropertyValue::Int(2)).unwrap();

        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "phase"), PropertyValue::Int(3));
        assert_eq!(s.get(Scope::Server(RuntimeId(2)), &golem(), "phase"), PropertyValue::Int(1));
        assert_eq!(s.get(Scope::Client(RuntimeId(9)), &golem(), "phase"), PropertyValue::Int(2));
        assert_eq!(s.get(Scope::Client(RuntimeId(8)), &golem(), "phase"), PropertyValue::Int(1));
    }

    #[test]
    fn merged_data_prefers_viewer_override() {
        let s = state();
        s.set(Scope::Server(RuntimeId(1)), &golem(), "phase", PropertyValue::Int(3)).unwrap();
        s.set(Scope::Server(RuntimeId(1)), &golem(), "glow", PropertyValue::Float(0.25)).unwrap();
        s.set(Scope::Client(RuntimeId(9)), &golem(), "glow", PropertyValue::Float(1.0)).unwrap();

        let for_viewer = s.merged_sync_data(RuntimeId(1), &golem(), Some(RuntimeId(9)));
        assert_eq!(for_viewer.int_properties.get(&0), Some(&3));
        assert_eq!(for_viewer.float_properties.get(&1), Some(&1.0));

        let for_other = s.merged_sync_data(RuntimeId(1), &golem(), Some(RuntimeId(8)));
        assert_eq!(for_other.float_properties.get(&1), Some(&0.25));

        let unknown_type = s.merged_sync_data(RuntimeId(1), &EntityTypeId::player(), None);
        assert!(unknown_type.is_empty());
    }

    #[test]
    fn storage_grows_with_new_slots() {
        let s = state();
        s.set(Scope::Server(RuntimeId(1)), &golem(), "phase", PropertyValue::Int(4)).unwrap();
        s.schema()
            .register(&golem(), SlotDefinition::int("late", 2, 0, 9))
            .unwrap();

        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "late"), PropertyValue::Int(2));
        s.set(Scope::Server(RuntimeId(1)), &golem(), "late", PropertyValue::Int(7)).unwrap();
        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "phase"), PropertyValue::Int(4));
        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "late"), PropertyValue::Int(7));
    }

    #[test]
    fn merges_and_writes_race_with_registration() {
        let s = Arc::new(state());
        let registrar = {
            let s = Arc::clone(&s);
            std::thread::spawn(move || {
                for i in 0..64 {
                    s.schema()
                        .register(&golem(), SlotDefinition::int(format!("extra{i}"), i, 0, 100))
                        .unwrap();
                }
            })
        };

        for round in 0..64 {
            s.set(Scope::Server(RuntimeId(1)), &golem(), "phase", PropertyValue::Int(round % 5))
                .unwrap();
            let data = s.merged_sync_data(RuntimeId(1), &golem(), None);
            assert_eq!(data.int_properties.get(&0), Some(&(round % 5)));
            assert_eq!(data.float_properties.get(&1), Some(&0.5));
        }
        registrar.join().unwrap();

        let data = s.merged_sync_data(RuntimeId(1), &golem(), None);
        assert_eq!(data.int_properties.len() + data.float_properties.len(), 66);
        assert_eq!(data.int_properties.get(&65), Some(&63));
    }

    #[test]
    fn forget_entity_and_viewer() {
        let s = state();
        s.set(Scope::Server(RuntimeId(1)), &golem(), "phase", PropertyValue::Int(3)).unwrap();
        s.set(Scope::Client(RuntimeId(9)), &golem(), "phase", PropertyValue::Int(2)).unwrap();

        assert!(s.forget_entity(RuntimeId(1)));
        assert!(!s.forget_entity(RuntimeId(1)));
        assert_eq!(s.tracked_entities(), 0);
        assert_eq!(s.get(Scope::Server(RuntimeId(1)), &golem(), "phase"), PropertyValue::Int(1));

        s.forget_viewer(RuntimeId(9));
        assert_eq!(s.get(Scope::Client(RuntimeId(9)), &golem(), "phase"), PropertyValue::Int(1));
    }
}
