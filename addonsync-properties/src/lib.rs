//! Entity property schemas and value synchronization.
//!
//! [`PropertySchemaRegistry`] holds the declared numeric properties of each
//! entity type and the schema packets built from them.
//! [`PropertySyncState`] stores server and per-viewer values against those
//! slots and produces the values attached to outgoing entity data.

mod error;
mod schema;
mod slot;
mod sync;

pub use error::PropertyError;
pub use schema::PropertySchemaRegistry;
pub use slot::{PropertySlot, SlotDefinition};
pub use sync::{PropertySyncState, Scope};
