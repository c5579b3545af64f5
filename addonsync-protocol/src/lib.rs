//! Packet contract and per-session packet pipeline.
//!
//! The host hands every outgoing packet to [`PacketPipeline::dispatch`]
//! together with the session it is addressed to. Interceptors run first in
//! priority order and may replace or cancel the packet; monitors run after
//! and may only mutate it in place.
//!
//! The packet structs in [`packets`] are the fields this layer needs from
//! the host's protocol types, exposed as plain public data.

mod error;
pub mod packets;
mod pipeline;
mod session;
pub mod tag;

pub use error::{PipelineError, ProtocolError, Stage};
pub use packets::{Packet, PacketKind, ProtocolPacket};
pub use pipeline::{priority, Dispatch, PacketPipeline, Verdict};
pub use session::{SessionContext, SessionLink};
pub use tag::{CompoundTag, Tag};
