//! Outgoing packets this layer reads or rewrites.
//!
//! Each struct exposes exactly the fields the pack and property hooks need.
//! Anything else the host sends passes through as [`RawPacket`].

use crate::tag::CompoundTag;
use addonsync_types::RuntimeId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Packet kind, used to key pipeline handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    PlayStatus,
    ResourcePacksInfo,
    ResourcePackStack,
    StartGame,
    RemoveActor,
    SetActorData,
    ResourcePackDataInfo,
    SyncActorProperty,
    Other(u32),
}

impl PacketKind {
    /// Protocol packet id.
    #[must_use]
    pub const fn network_id(&self) -> u32 {
        match self {
            Self::PlayStatus => 0x02,
            Self::ResourcePacksInfo => 0x06,
            Self::ResourcePackStack => 0x07,
            Self::StartGame => 0x0b,
            Self::RemoveActor => 0x0e,
            Self::SetActorData => 0x27,
            Self::ResourcePackDataInfo => 0x52,
            Self::SyncActorProperty => 0xa5,
            Self::Other(id) => *id,
        }
    }

    #[must_use]
    pub const fn from_network_id(id: u32) -> Self {
        match id {
            0x02 => Self::PlayStatus,
            0x06 => Self::ResourcePacksInfo,
            0x07 => Self::ResourcePackStack,
            0x0b => Self::StartGame,
            0x0e => Self::RemoveActor,
            0x27 => Self::SetActorData,
            0x52 => Self::ResourcePackDataInfo,
            0xa5 => Self::SyncActorProperty,
            other => Self::Other(other),
        }
    }
}

// ── Packet bodies ────────────────────────────────────────────────

/// Login progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    LoginSuccess,
    FailedClient,
    FailedServer,
    PlayerSpawn,
    FailedInvalidTenant,
    FailedVanillaEdu,
    FailedIncompatible,
    FailedServerFull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayStatusPacket {
    pub status: PlayStatus,
}

/// A named experiment toggle set, as carried by game start and stack packets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experiments {
    pub entries: Vec<(String, bool)>,
    pub previously_used: bool,
}

impl Experiments {
    /// Sets `name` to `enabled`, replacing an existing entry with the same
    /// name in place and appending otherwise.
    pub fn set(&mut self, name: &str, enabled: bool) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = enabled,
            None => self.entries.push((name.to_string(), enabled)),
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, on)| n == name && *on)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSettings {
    pub experiments: Experiments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartGamePacket {
    pub actor_runtime_id: RuntimeId,
    pub level_settings: LevelSettings,
    /// Property schema of the player entity type.
    pub player_actor_properties: Arc<CompoundTag>,
}

/// One advertised pack in the resource-pack info packet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePackInfoEntry {
    pub pack_id: String,
    pub version: String,
    pub size_bytes: u64,
    pub encryption_key: String,
    pub sub_pack_name: String,
    pub content_id: String,
    pub has_scripts: bool,
    pub is_addon_pack: bool,
    pub is_ray_tracing_capable: bool,
    pub cdn_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePacksInfoPacket {
    pub must_accept: bool,
    pub has_addons: bool,
    pub has_scripts: bool,
    pub force_server_packs: bool,
    pub entries: Vec<ResourcePackInfoEntry>,
}

/// Declared category of a pack being transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePackType {
    Invalid,
    Addon,
    Cached,
    CopyProtected,
    Behaviors,
    PersonaPiece,
    Resources,
    Skins,
    WorldTemplate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePackDataInfoPacket {
    pub pack_id: String,
    pub max_chunk_size: u32,
    pub chunk_count: u32,
    pub compressed_pack_size: u64,
    pub sha256: Vec<u8>,
    pub is_premium: bool,
    pub pack_type: ResourcePackType,
}

/// One entry of a pack stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackStackEntry {
    pub pack_id: String,
    pub version: String,
    pub sub_pack_name: String,
}

impl PackStackEntry {
    pub fn new(pack_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            pack_id: pack_id.into(),
            version: version.into(),
            sub_pack_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePackStackPacket {
    pub must_accept: bool,
    pub resource_pack_stack: Vec<PackStackEntry>,
    pub behavior_pack_stack: Vec<PackStackEntry>,
    pub base_game_version: String,
    pub experiments: Experiments,
    pub use_vanilla_editor_packs: bool,
}

/// Entity metadata values; opaque to this layer beyond being carried along.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
}

/// Synced property values keyed by slot index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySyncData {
    pub int_properties: BTreeMap<u32, i32>,
    pub float_properties: BTreeMap<u32, f32>,
}

impl PropertySyncData {
    pub fn is_empty(&self) -> bool {
        self.int_properties.is_empty() && self.float_properties.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetActorDataPacket {
    pub actor_runtime_id: RuntimeId,
    pub metadata: BTreeMap<u32, MetadataValue>,
    pub synced_properties: PropertySyncData,
    pub tick: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveActorPacket {
    pub actor_runtime_id: RuntimeId,
}

/// Property schema of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncActorPropertyPacket {
    pub data: Arc<CompoundTag>,
}

/// A packet this layer does not interpret.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPacket {
    pub id: u32,
    pub payload: Vec<u8>,
}

// ── Packet envelope ──────────────────────────────────────────────

/// Any outgoing packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    PlayStatus(PlayStatusPacket),
    ResourcePacksInfo(ResourcePacksInfoPacket),
    ResourcePackStack(ResourcePackStackPacket),
    StartGame(StartGamePacket),
    RemoveActor(RemoveActorPacket),
    SetActorData(SetActorDataPacket),
    ResourcePackDataInfo(ResourcePackDataInfoPacket),
    SyncActorProperty(SyncActorPropertyPacket),
    Raw(RawPacket),
}

impl Packet {
    #[must_use]
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::PlayStatus(_) => PacketKind::PlayStatus,
            Self::ResourcePacksInfo(_) => PacketKind::ResourcePacksInfo,
            Self::ResourcePackStack(_) => PacketKind::ResourcePackStack,
            Self::StartGame(_) => PacketKind::StartGame,
            Self::RemoveActor(_) => PacketKind::RemoveActor,
            Self::SetActorData(_) => PacketKind::SetActorData,
            Self::ResourcePackDataInfo(_) => PacketKind::ResourcePackDataInfo,
            Self::SyncActorProperty(_) => PacketKind::SyncActorProperty,
            Self::Raw(raw) => PacketKind::from_network_id(raw.id),
        }
    }
}

/// A packet body that can be viewed through the [`Packet`] envelope.
/// Lets handlers be registered against the concrete struct they edit.
pub trait ProtocolPacket: Sized + Send + 'static {
    const KIND: PacketKind;

    /// Unwraps the body, handing the envelope back if it holds another kind.
    fn from_packet(packet: Packet) -> Result<Self, Packet>;

    fn from_packet_mut(packet: &mut Packet) -> Option<&mut Self>;

    fn into_packet(self) -> Packet;
}

macro_rules! protocol_packet {
    ($body:ty, $variant:ident) => {
        impl ProtocolPacket for $body {
            const KIND: PacketKind = PacketKind::$variant;

            fn from_packet(packet: Packet) -> Result<Self, Packet> {
                match packet {
                    Packet::$variant(body) => Ok(body),
                    other => Err(other),
                }
            }

            fn from_packet_mut(packet: &mut Packet) -> Option<&mut Self> {
                match packet {
                    Packet::$variant(body) => Some(body),
                    _ => None,
                }
            }

            fn into_packet(self) -> Packet {
                Packet::$variant(self)
            }
        }

        impl From<$body> for Packet {
            fn from(body: $body) -> Self {
                Packet::$variant(body)
            }
        }
    };
}

protocol_packet!(PlayStatusPacket, PlayStatus);
protocol_packet!(ResourcePacksInfoPacket, ResourcePacksInfo);
protocol_packet!(ResourcePackStackPacket, ResourcePackStack);
protocol_packet!(StartGamePacket, StartGame);
protocol_packet!(RemoveActorPacket, RemoveActor);
protocol_packet!(SetActorDataPacket, SetActorData);
protocol_packet!(ResourcePackDataInfoPacket, ResourcePackDataInfo);
protocol_packet!(SyncActorPropertyPacket, SyncActorProperty);
