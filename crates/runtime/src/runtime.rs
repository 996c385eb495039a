//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires up the command channel and
//! event bus, and exposes a builder-based API for clients to drive an
//! encounter.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tabletop_content::Encounter;
use tabletop_core::{CombatState, MapSnapshot, RandomSource, RulesConfig};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::chat::{BusChatSink, ChatSink};
use crate::config::SessionConfig;
use crate::events::EventBus;
use crate::session::Session;
use crate::workers::{Command, SessionWorker};

/// Runtime that hosts (or mirrors) one encounter.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker stops once every outstanding handle is dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: SessionConfig,
    encounter: Option<(CombatState, MapSnapshot, RulesConfig)>,
    chat: Option<Box<dyn ChatSink>>,
    rng: Option<Box<dyn RandomSource + Send>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            encounter: None,
            chat: None,
            rng: None,
        }
    }

    /// Override session configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Encounter loaded through `tabletop-content`
    pub fn encounter(mut self, encounter: Encounter) -> Self {
        self.encounter = Some((encounter.state, encounter.map, encounter.rules));
        self
    }

    /// Encounter assembled by hand
    pub fn state(mut self, state: CombatState, map: MapSnapshot, rules: RulesConfig) -> Self {
        self.encounter = Some((state, map, rules));
        self
    }

    /// Replace the default sink, which forwards to the `Chat` topic.
    pub fn chat_sink(mut self, sink: impl ChatSink + 'static) -> Self {
        self.chat = Some(Box::new(sink));
        self
    }

    /// Replace the dice seeded from the config.
    pub fn rng(mut self, rng: impl RandomSource + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Build the runtime and spawn its worker. Must run inside a Tokio
    /// runtime.
    pub fn build(self) -> Result<Runtime> {
        let (state, map, rules) = self.encounter.ok_or(RuntimeError::MissingEncounter)?;

        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let chat = self
            .chat
            .unwrap_or_else(|| Box::new(BusChatSink::new(event_bus.clone())) as Box<dyn ChatSink>);
        let mut session = Session::new(&self.config, state, map, rules, chat);
        if let Some(rng) = self.rng {
            session.set_rng(rng);
        }
        let worker = SessionWorker::new(session, command_rx, event_bus);

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime { handle, worker_handle })
    }
}
