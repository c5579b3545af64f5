//! Per-entity-type property schemas.
//!
//! Slots are append-only: a slot's index is its position in its type's
//! list and never changes, so value storage can be plain arrays that are
//! grown when new slots appear.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use addonsync_protocol::packets::SyncActorPropertyPacket;
use addonsync_protocol::{CompoundTag, Tag};
use addonsync_types::EntityTypeId;
use tracing::debug;

use crate::slot::{PropertySlot, SlotDefinition};
use crate::PropertyError;

struct TypeSchema {
    entity_type: EntityTypeId,
    slots: Vec<PropertySlot>,
    by_name: HashMap<String, usize>,
    tag: OnceLock<Arc<CompoundTag>>,
    packet: OnceLock<Arc<SyncActorPropertyPacket>>,
}

impl TypeSchema {
    fn new(entity_type: EntityTypeId) -> Self {
        Self {
            entity_type,
            slots: Vec::new(),
            by_name: HashMap::new(),
            tag: OnceLock::new(),
            packet: OnceLock::new(),
        }
    }

    fn tag(&self) -> Arc<CompoundTag> {
        Arc::clone(self.tag.get_or_init(|| {
            let properties = self.slots.iter().map(|s| Tag::Compound(s.to_tag())).collect();
            Arc::new(
                CompoundTag::new()
                    .with("properties", Tag::List(properties))
                    .with("type", Tag::String(self.entity_type.to_string())),
            )
        }))
    }

    fn packet(&self) -> Arc<SyncActorPropertyPacket> {
        Arc::clone(
            self.packet
                .get_or_init(|| Arc::new(SyncActorPropertyPacket { data: self.tag() })),
        )
    }
}

#[derive(Default)]
struct SchemaTable {
    types: Vec<TypeSchema>,
    index: HashMap<EntityTypeId, usize>,
}

/// Registered property slots for every entity type, plus the schema
/// packets built from them.
#[derive(Default)]
pub struct PropertySchemaRegistry {
    table: RwLock<SchemaTable>,
}

impl PropertySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot to `entity_type`. Nothing is added on error.
    pub fn register(
        &self,
        entity_type: &EntityTypeId,
        definition: SlotDefinition,
    ) -> Result<PropertySlot, PropertyError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = table
            .index
            .get(entity_type)
            .and_then(|&t| table.types[t].slots.iter().find(|s| s.name == definition.name))
        {
            return Err(if existing.kind == definition.kind {
                PropertyError::DuplicateProperty {
                    entity_type: entity_type.clone(),
                    name: definition.name,
                }
            } else {
                PropertyError::KindMismatch {
                    entity_type: entity_type.clone(),
                    name: definition.name,
                    existing: existing.kind,
                    requested: definition.kind,
                }
            });
        }

        let default = definition.validate()?;

        let position = match table.index.get(entity_type) {
            Some(&t) => t,
            None => {
                let t = table.types.len();
                table.types.push(TypeSchema::new(entity_type.clone()));
                table.index.insert(entity_type.clone(), t);
                t
            }
        };
        let schema = &mut table.types[position];

        let slot = PropertySlot {
            entity_type: entity_type.clone(),
            index: schema.slots.len() as u32,
            name: definition.name,
            kind: definition.kind,
            default,
            min: definition.min,
            max: definition.max,
        };
        schema.by_name.insert(slot.name.clone(), schema.slots.len());
        schema.slots.push(slot.clone());
        schema.tag = OnceLock::new();
        schema.packet = OnceLock::new();

        debug!(
            entity_type = %entity_type,
            property = %slot.name,
            kind = %slot.kind,
            index = slot.index,
            "registered sync property"
        );
        Ok(slot)
    }

    /// Looks up a slot by type-qualified name.
    pub fn resolve(&self, entity_type: &EntityTypeId, name: &str) -> Option<PropertySlot> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let schema = &table.types[*table.index.get(entity_type)?];
        schema.by_name.get(name).map(|&i| schema.slots[i].clone())
    }

    /// All slots of `entity_type` in index order.
    pub fn slots(&self, entity_type: &EntityTypeId) -> Vec<PropertySlot> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .index
            .get(entity_type)
            .map(|&t| table.types[t].slots.clone())
            .unwrap_or_default()
    }

    /// Runs `f` over the slots of `entity_type` while holding the read
    /// lock. `f` must not register slots.
    pub(crate) fn with_slots<R>(
        &self,
        entity_type: &EntityTypeId,
        f: impl FnOnce(&[PropertySlot]) -> R,
    ) -> R {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let slots = table
            .index
            .get(entity_type)
            .map_or(&[][..], |&t| table.types[t].slots.as_slice());
        f(slots)
    }

    pub fn slot_count(&self, entity_type: &EntityTypeId) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .index
            .get(entity_type)
            .map_or(0, |&t| table.types[t].slots.len())
    }

    /// Entity types with at least one slot, in first-registration order.
    pub fn entity_types(&self) -> Vec<EntityTypeId> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .types
            .iter()
            .filter(|s| !s.slots.is_empty())
            .map(|s| s.entity_type.clone())
            .collect()
    }

    /// One schema packet per entity type with slots. Packets are cached
    /// until the next registration for their type.
    pub fn schema_packets(&self) -> Vec<Arc<SyncActorPropertyPacket>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .types
            .iter()
            .filter(|s| !s.slots.is_empty())
            .map(TypeSchema::packet)
            .collect()
    }

    /// Schema tag of the player type, sent with game start. Empty when no
    /// player property is registered.
    pub fn player_snapshot(&self) -> Arc<CompoundTag> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        match table.index.get(&EntityTypeId::player()) {
            Some(&t) if !table.types[t].slots.is_empty() => table.types[t].tag(),
            _ => Arc::new(CompoundTag::new()),
        }
    }
}
