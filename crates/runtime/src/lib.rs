//! Session host for the combat engine.
//!
//! This crate wraps `tabletop-core` in an authoritative session, runs it on a
//! worker task, and replicates resolved outcomes to peers. Consumers embed
//! [`Runtime`] and talk to it through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`session`] owns the combat state, pending decisions and dice
//! - [`interaction`] holds the step-by-step attack and contest flows
//! - [`protocol`] defines the tagged wire messages
//! - [`events`] provides the topic-based event bus
//! - [`chat`] defines where log lines and table talk go
pub mod api;
pub mod chat;
pub mod config;
pub mod events;
pub mod interaction;
pub mod protocol;
pub mod runtime;
pub mod session;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use chat::{BusChatSink, ChatEntry, ChatKind, ChatLog, ChatSink};
pub use config::{SessionConfig, SessionRole};
pub use events::{CombatEvent, Event, EventBus, Topic, TurnEvent};
pub use interaction::{
    AttackFlow, AttackInput, AttackStep, ContestFlow, ContestInput, ContestStep, InteractionError,
};
pub use protocol::{ProtocolError, WireMessage};
pub use runtime::{Runtime, RuntimeBuilder};
pub use session::{ActionResolution, DecisionId, DecisionResolution, Session};
