//! Two-stage outgoing packet pipeline.
//!
//! Handlers are keyed by [`PacketKind`]. Each kind keeps an immutable
//! snapshot of its handler list (`Arc<[_]>`) that registration replaces
//! wholesale, so dispatch only clones an `Arc` and never runs handlers
//! under the registration lock.

use crate::error::{PipelineError, Stage};
use crate::packets::{Packet, PacketKind, ProtocolPacket};
use crate::session::SessionContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

type InterceptFn =
    dyn Fn(Packet, &SessionContext) -> anyhow::Result<Verdict<Packet>> + Send + Sync + 'static;
type MonitorFn = dyn Fn(&mut Packet, &SessionContext) -> anyhow::Result<()> + Send + Sync + 'static;

/// Interceptor priorities. Higher runs earlier.
pub mod priority {
    pub const LOWEST: i32 = -200;
    pub const LOW: i32 = -100;
    pub const NORMAL: i32 = 0;
    pub const HIGH: i32 = 100;
    pub const HIGHEST: i32 = 200;
}

/// What an interceptor decided.
#[derive(Debug)]
pub enum Verdict<P> {
    /// Continue with this packet (the original or a replacement).
    Forward(P),
    /// Stop delivery. Later interceptors and all monitors are skipped.
    Cancel,
}

/// Result of a dispatch that did not fail.
#[derive(Debug)]
pub enum Dispatch {
    /// Send this packet to the wire.
    Deliver(Packet),
    Cancelled,
}

#[derive(Clone)]
struct InterceptorEntry {
    priority: i32,
    seq: u64,
    handler: Arc<InterceptFn>,
}

/// Per-kind handler chains shared by every session.
#[derive(Default)]
pub struct PacketPipeline {
    interceptors: RwLock<HashMap<PacketKind, Arc<[InterceptorEntry]>>>,
    monitors: RwLock<HashMap<PacketKind, Arc<[Arc<MonitorFn>]>>>,
    seq: AtomicU64,
}

impl PacketPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an interceptor for `kind`. Among interceptors of the same
    /// priority, earlier registrations run first.
    pub fn intercept<F>(&self, kind: PacketKind, priority: i32, handler: F)
    where
        F: Fn(Packet, &SessionContext) -> anyhow::Result<Verdict<Packet>> + Send + Sync + 'static,
    {
        let entry = InterceptorEntry {
            priority,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            handler: Arc::new(handler),
        };
        let mut map = self
            .interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut chain: Vec<InterceptorEntry> =
            map.get(&kind).map(|c| c.to_vec()).unwrap_or_default();
        chain.push(entry);
        chain.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        map.insert(kind, chain.into());
    }

    /// Registers an interceptor against a concrete packet body. Packets of
    /// the kind that do not carry that body (raw forms) pass through.
    pub fn intercept_typed<P, F>(&self, priority: i32, handler: F)
    where
        P: ProtocolPacket,
        F: Fn(P, &SessionContext) -> anyhow::Result<Verdict<P>> + Send + Sync + 'static,
    {
        self.intercept(P::KIND, priority, move |packet, session| {
            match P::from_packet(packet) {
                Ok(body) => Ok(match handler(body, session)? {
                    Verdict::Forward(body) => Verdict::Forward(body.into_packet()),
                    Verdict::Cancel => Verdict::Cancel,
                }),
                Err(other) => Ok(Verdict::Forward(other)),
            }
        });
    }

    /// Registers a monitor for `kind`. Monitors run in registration order.
    pub fn monitor<F>(&self, kind: PacketKind, handler: F)
    where
        F: Fn(&mut Packet, &SessionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut map = self.monitors.write().unwrap_or_else(PoisonError::into_inner);
        let mut chain: Vec<Arc<MonitorFn>> =
            map.get(&kind).map(|c| c.to_vec()).unwrap_or_default();
        chain.push(Arc::new(handler));
        map.insert(kind, chain.into());
    }

    /// Registers a monitor against a concrete packet body.
    pub fn monitor_typed<P, F>(&self, handler: F)
    where
        P: ProtocolPacket,
        F: Fn(&mut P, &SessionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.monitor(P::KIND, move |packet, session| match P::from_packet_mut(packet) {
            Some(body) => handler(body, session),
            None => Ok(()),
        });
    }

    /// Number of handlers registered for `kind` across both stages.
    pub fn handler_count(&self, kind: PacketKind) -> usize {
        let interceptors = self
            .interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, |c| c.len());
        let monitors = self
            .monitors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, |c| c.len());
        interceptors + monitors
    }

    /// Runs every handler for one outgoing packet on one session.
    ///
    /// Dispatches on the same session are serialized; different sessions
    /// proceed in parallel. A handler error aborts this dispatch only.
    pub fn dispatch(
        &self,
        packet: Packet,
        session: &SessionContext,
    ) -> Result<Dispatch, PipelineError> {
        let _serial = session.serialize();

        let kind = packet.kind();
        let mut packet = packet;
        for entry in self.interceptors_for(kind).iter() {
            match (entry.handler)(packet, session) {
                Ok(Verdict::Forward(next)) => packet = next,
                Ok(Verdict::Cancel) => {
                    debug!(session = %session.id(), ?kind, "packet cancelled by interceptor");
                    return Ok(Dispatch::Cancelled);
                }
                Err(e) => return Err(handler_failed(session, kind, Stage::Intercept, e)),
            }
        }

        let kind = packet.kind();
        for monitor in self.monitors_for(kind).iter() {
            monitor(&mut packet, session)
                .map_err(|e| handler_failed(session, kind, Stage::Monitor, e))?;
        }

        Ok(Dispatch::Deliver(packet))
    }

    fn interceptors_for(&self, kind: PacketKind) -> Arc<[InterceptorEntry]> {
        self.interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn monitors_for(&self, kind: PacketKind) -> Arc<[Arc<MonitorFn>]> {
        self.monitors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }
}

fn handler_failed(
    session: &SessionContext,
    kind: PacketKind,
    stage: Stage,
    error: anyhow::Error,
) -> PipelineError {
    warn!(session = %session.id(), ?kind, %stage, error = %error, "packet handler failed; packet dropped");
    PipelineError::Handler {
        session: session.id(),
        kind,
        stage,
        source: error.into(),
    }
}
