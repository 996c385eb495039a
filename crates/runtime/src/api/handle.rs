//! Cloneable façade for issuing commands to the session worker.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving the encounter or streaming events from specific topics.

use tokio::sync::{broadcast, mpsc, oneshot};

use tabletop_core::combat::DiceRoll;
use tabletop_core::{CombatAction, CombatState, DecisionChoice, EntityId, TurnAdvance};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::protocol::WireMessage;
use crate::session::{ActionResolution, DecisionId, DecisionResolution};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Resolve and apply an action. `None` when it named nothing that exists.
    pub async fn submit(&self, action: CombatAction) -> Result<Option<ActionResolution>> {
        self.request(|reply| Command::Submit { action, reply }).await?
    }

    pub async fn resolve_decision(&self, id: DecisionId, choice: DecisionChoice) -> Result<DecisionResolution> {
        self.request(|reply| Command::ResolveDecision { id, choice, reply })
            .await?
    }

    pub async fn roll_initiative(&self, entity: EntityId) -> Result<i32> {
        self.request(|reply| Command::RollInitiative { entity, reply })
            .await?
    }

    pub async fn advance_turn(&self) -> Result<TurnAdvance> {
        self.request(|reply| Command::AdvanceTurn { reply }).await?
    }

    pub async fn end_combat(&self) -> Result<()> {
        self.request(|reply| Command::EndCombat { reply }).await?
    }

    pub async fn roll_dice(&self, roller: impl Into<String>, expression: impl Into<String>) -> Result<DiceRoll> {
        let (roller, expression) = (roller.into(), expression.into());
        self.request(|reply| Command::RollDice {
            roller,
            expression,
            reply,
        })
        .await?
    }

    pub async fn say(&self, speaker: impl Into<String>, text: impl Into<String>) -> Result<()> {
        self.command_tx
            .send(Command::Say {
                speaker: speaker.into(),
                text: text.into(),
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Apply a message received from the other side of the table.
    pub async fn apply_remote(&self, message: WireMessage) -> Result<()> {
        self.request(|reply| Command::ApplyRemote { message, reply })
            .await?
    }

    /// Query the current combat state (read-only snapshot)
    pub async fn query_state(&self) -> Result<CombatState> {
        self.request(|reply| Command::QueryState { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Combat` - Resolved actions, decisions and rejections
    /// - `Topic::Turn` - Initiative and turn order
    /// - `Topic::Chat` - Log lines and table talk
    /// - `Topic::Outbound` - Wire messages for the transport to send
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
