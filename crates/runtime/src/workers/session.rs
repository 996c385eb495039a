//! Session worker that owns the authoritative [`Session`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), runs them
//! against the session, and publishes what changed to the [`EventBus`].

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use tabletop_core::combat::DiceRoll;
use tabletop_core::{CombatAction, CombatState, DecisionChoice, EntityId, TurnAdvance};

use crate::api::Result;
use crate::events::{CombatEvent, Event, EventBus, extract_events};
use crate::protocol::WireMessage;
use crate::session::{ActionResolution, DecisionId, DecisionResolution, Session};

/// Commands that can be sent to the session worker
pub enum Command {
    Submit {
        action: CombatAction,
        reply: oneshot::Sender<Result<Option<ActionResolution>>>,
    },
    ResolveDecision {
        id: DecisionId,
        choice: DecisionChoice,
        reply: oneshot::Sender<Result<DecisionResolution>>,
    },
    RollInitiative {
        entity: EntityId,
        reply: oneshot::Sender<Result<i32>>,
    },
    AdvanceTurn {
        reply: oneshot::Sender<Result<TurnAdvance>>,
    },
    EndCombat {
        reply: oneshot::Sender<Result<()>>,
    },
    RollDice {
        roller: String,
        expression: String,
        reply: oneshot::Sender<Result<DiceRoll>>,
    },
    Say {
        speaker: String,
        text: String,
    },
    /// A message received from the other side of the table.
    ApplyRemote {
        message: WireMessage,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Query the current combat state (read-only).
    QueryState { reply: oneshot::Sender<CombatState> },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Submit { .. } => "submit",
            Command::ResolveDecision { .. } => "resolve_decision",
            Command::RollInitiative { .. } => "roll_initiative",
            Command::AdvanceTurn { .. } => "advance_turn",
            Command::EndCombat { .. } => "end_combat",
            Command::RollDice { .. } => "roll_dice",
            Command::Say { .. } => "say",
            Command::ApplyRemote { .. } => "apply_remote",
            Command::QueryState { .. } => "query_state",
        }
    }
}

/// Background task that processes session commands.
pub struct SessionWorker {
    session: Session,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SessionWorker {
    pub fn new(session: Session, command_rx: mpsc::Receiver<Command>, event_bus: EventBus) -> Self {
        Self {
            session,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop. Ends when every handle is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!(target: "runtime::worker", "command channel closed, session worker stopping");
    }

    fn handle_command(&mut self, cmd: Command) {
        let name = cmd.name();
        match cmd {
            Command::Submit { action, reply } => {
                let result = self.session.submit(&action);
                self.finish(name, result, reply);
            }
            Command::ResolveDecision { id, choice, reply } => {
                let result = self.session.resolve_decision(id, &choice);
                self.finish(name, result, reply);
            }
            Command::RollInitiative { entity, reply } => {
                let result = self.session.roll_initiative(entity);
                self.finish(name, result, reply);
            }
            Command::AdvanceTurn { reply } => {
                let result = self.session.advance_turn();
                self.finish(name, result, reply);
            }
            Command::EndCombat { reply } => {
                let result = self.session.end_combat();
                self.finish(name, result, reply);
            }
            Command::RollDice {
                roller,
                expression,
                reply,
            } => {
                let result = self.session.roll_dice(&roller, &expression);
                self.finish(name, result, reply);
            }
            Command::Say { speaker, text } => {
                self.session.say(&speaker, &text);
                self.flush_outbox();
            }
            Command::ApplyRemote { message, reply } => {
                let result = self.session.apply_remote(&message);
                if result.is_ok() {
                    for event in extract_events(&message) {
                        self.event_bus.publish(event);
                    }
                }
                self.finish(name, result, reply);
            }
            Command::QueryState { reply } => {
                if reply.send(self.session.state().clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryState reply channel closed (caller dropped)");
                }
            }
        }
    }

    /// Publishes what the command queued, reports failures, and replies.
    fn finish<T>(&mut self, command: &'static str, result: Result<T>, reply: oneshot::Sender<Result<T>>) {
        match &result {
            Ok(_) => self.flush_outbox(),
            Err(error) => {
                warn!(
                    target: "runtime::worker",
                    command,
                    severity = error.severity().as_str(),
                    %error,
                    "command rejected"
                );
                self.event_bus.publish(Event::Combat(CombatEvent::Rejected {
                    command: command.to_owned(),
                    error: error.to_string(),
                }));
            }
        }
        if reply.send(result).is_err() {
            debug!(target: "runtime::worker", command, "reply channel closed (caller dropped)");
        }
    }

    /// Host messages go out on `Outbound` together with the events they
    /// stand for.
    fn flush_outbox(&mut self) {
        for message in self.session.drain_outbox() {
            for event in extract_events(&message) {
                self.event_bus.publish(event);
            }
            self.event_bus.publish(Event::Outbound(message));
        }
    }
}
