//! Error types for the protocol crate.

use crate::packets::PacketKind;
use addonsync_types::SessionId;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("list tag mixes element types (expected tag {expected}, found tag {found})")]
    HeterogeneousList { expected: u8, found: u8 },

    #[error("string of {0} bytes does not fit a tag length prefix")]
    StringTooLong(usize),

    #[error("list of {0} elements does not fit a tag length prefix")]
    ListTooLong(usize),
}

/// Pipeline stage a handler was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intercept,
    Monitor,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intercept => f.write_str("intercept"),
            Self::Monitor => f.write_str("monitor"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} handler for {kind:?} failed on {session}: {source}")]
    Handler {
        session: SessionId,
        kind: PacketKind,
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
