//! Entity property service and the packet hooks that deliver values.

use std::sync::Arc;

use addonsync_pack::{EntityDefinition, PropertyDeclaration};
use addonsync_properties::{
    PropertyError, PropertySchemaRegistry, PropertySlot, PropertySyncState, Scope, SlotDefinition,
};
use addonsync_protocol::packets::{
    PlayStatus, PlayStatusPacket, RemoveActorPacket, SetActorDataPacket, StartGamePacket,
};
use addonsync_protocol::{Packet, PacketPipeline};
use addonsync_types::{EntityTypeId, PropertyKind, PropertyValue, RuntimeId};
use tracing::{debug, error, warn};

use crate::error::HostError;
use crate::host::EntityDirectory;

/// Server-side entry point for entity properties.
///
/// Server values apply to every viewer; client values override them for
/// a single viewer.
pub struct EntityProperties {
    state: Arc<PropertySyncState>,
    directory: Arc<dyn EntityDirectory>,
}

impl EntityProperties {
    pub fn new(state: Arc<PropertySyncState>, directory: Arc<dyn EntityDirectory>) -> Self {
        Self { state, directory }
    }

    pub fn schema(&self) -> &Arc<PropertySchemaRegistry> {
        self.state.schema()
    }

    pub fn state(&self) -> &Arc<PropertySyncState> {
        &self.state
    }

    pub fn register_property(
        &self,
        entity_type: &EntityTypeId,
        name: impl Into<String>,
        kind: PropertyKind,
        default: PropertyValue,
        min: PropertyValue,
        max: PropertyValue,
    ) -> Result<PropertySlot, PropertyError> {
        self.schema().register(
            entity_type,
            SlotDefinition {
                name: name.into(),
                kind,
                default,
                min,
                max,
            },
        )
    }

    /// Registers every property an entity definition declares. Bad
    /// declarations are logged and skipped. Returns how many registered.
    pub fn register_definition(&self, definition: &EntityDefinition) -> usize {
        let entity_type = match EntityTypeId::new(definition.identifier.as_str()) {
            Ok(t) => t,
            Err(e) => {
                error!(identifier = %definition.identifier, error = %e, "invalid entity identifier");
                return 0;
            }
        };
        definition
            .properties
            .iter()
            .filter(|decl| self.register_declaration(&entity_type, decl))
            .count()
    }

    fn register_declaration(&self, entity_type: &EntityTypeId, decl: &PropertyDeclaration) -> bool {
        match self.register_property(
            entity_type,
            decl.name.as_str(),
            decl.kind,
            decl.default,
            decl.min,
            decl.max,
        ) {
            Ok(_) => true,
            Err(e) => {
                error!(%entity_type, property = %decl.name, error = %e, "could not register declared property");
                false
            }
        }
    }

    /// Server value of a live entity's property.
    pub fn get_property(&self, runtime_id: RuntimeId, name: &str) -> PropertyValue {
        let Some(entity_type) = self.directory.entity_type_of(runtime_id) else {
            warn!(%runtime_id, property = name, "property read on unknown entity");
            return PropertyValue::Int(0);
        };
        self.state.get(Scope::Server(runtime_id), &entity_type, name)
    }

    /// Sets a server value and resends the entity to everyone viewing it.
    pub fn set_property(
        &self,
        runtime_id: RuntimeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertySlot, HostError> {
        let Some(entity_type) = self.directory.entity_type_of(runtime_id) else {
            warn!(%runtime_id, property = name, "property write on unknown entity");
            return Err(HostError::UnknownEntity(runtime_id));
        };
        let slot = self
            .state
            .set(Scope::Server(runtime_id), &entity_type, name, value)?;
        self.directory.resend_actor_data(runtime_id, None);
        Ok(slot)
    }

    /// Value `viewer` sees for every entity of `entity_type`.
    pub fn get_client_property(
        &self,
        viewer: RuntimeId,
        entity_type: &EntityTypeId,
        name: &str,
    ) -> PropertyValue {
        self.state.get(Scope::Client(viewer), entity_type, name)
    }

    /// Overrides a property for one viewer. With `resend`, every entity of
    /// the type the viewer can see is sent to it again right away.
    pub fn set_client_property(
        &self,
        viewer: RuntimeId,
        entity_type: &EntityTypeId,
        name: &str,
        value: PropertyValue,
        resend: bool,
    ) -> Result<PropertySlot, PropertyError> {
        let slot = self
            .state
            .set(Scope::Client(viewer), entity_type, name, value)?;
        if resend {
            for runtime_id in self.directory.entities_visible_to(viewer, entity_type) {
                self.directory.resend_actor_data(runtime_id, Some(viewer));
            }
        }
        Ok(slot)
    }

    /// Drops the overrides of a player that left.
    pub fn player_left(&self, viewer: RuntimeId) {
        self.state.forget_viewer(viewer);
        debug!(%viewer, "cleared client properties");
    }

    /// Installs the hooks that carry schemas and values to sessions.
    pub fn install_hooks(self: &Arc<Self>, pipeline: &PacketPipeline) {
        let schema = Arc::clone(self.schema());
        pipeline.monitor_typed::<StartGamePacket, _>(move |packet, _| {
            packet.player_actor_properties = schema.player_snapshot();
            Ok(())
        });

        let this = Arc::clone(self);
        pipeline.monitor_typed::<SetActorDataPacket, _>(move |packet, session| {
            let Some(entity_type) = this.directory.entity_type_of(packet.actor_runtime_id) else {
                return Ok(());
            };
            if this.schema().slot_count(&entity_type) == 0 {
                return Ok(());
            }
            packet.synced_properties =
                this.state
                    .merged_sync_data(packet.actor_runtime_id, &entity_type, session.player());
            Ok(())
        });

        let state = Arc::clone(&self.state);
        pipeline.monitor_typed::<RemoveActorPacket, _>(move |packet, _| {
            state.forget_entity(packet.actor_runtime_id);
            Ok(())
        });

        let state = Arc::clone(&self.state);
        pipeline.monitor_typed::<PlayStatusPacket, _>(move |packet, session| {
            if packet.status != PlayStatus::LoginSuccess {
                return Ok(());
            }
            let packets = state.build_schema_packets();
            debug!(session = %session.id(), types = packets.len(), "sending property schemas");
            for schema in packets {
                session.send(Packet::SyncActorProperty((*schema).clone()));
            }
            Ok(())
        });
    }
}
