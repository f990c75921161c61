//! Queue of edits submitted from outside the simulation loop.
//!
//! The editing layer (UI, scripting, replay) pushes [`Command`]s whenever it
//! likes; [`Simulator::apply_commands`](crate::engine::Simulator::apply_commands)
//! executes them between steps, so an edit never lands in the middle of an
//! evaluate/commit pair.

use crate::component::ComponentKind;
use crate::id::{ComponentId, Position, Waypoint, WireId};

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single edit. Each one either fully applies or is rejected unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Place a new component.
    AddComponent {
        kind: ComponentKind,
        position: Position,
        name: Option<String>,
        protected: bool,
    },
    /// Remove a component and everything wired to it.
    RemoveComponent { component: ComponentId },
    /// Wire output pin `output` of `source` to input pin `input` of `target`.
    Connect {
        source: ComponentId,
        output: usize,
        target: ComponentId,
        input: usize,
        path: Vec<Waypoint>,
    },
    /// Remove all connections from `wire` to input pin `input` of `target`.
    Disconnect {
        wire: WireId,
        target: ComponentId,
        input: usize,
    },
    /// Toggle an input or switch.
    Activate { component: ComponentId },
    /// Move a component on the canvas.
    Move {
        component: ComponentId,
        position: Position,
    },
    /// Change a component's display name.
    Rename { component: ComponentId, name: String },
}

/// What an applied command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Added(ComponentId),
    /// `false` if the component was already gone.
    Removed(bool),
    Connected(WireId),
    /// Number of connections removed.
    Disconnected(usize),
    Applied,
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting for the next step boundary, with optional history.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Executed commands with the tick they were drained at.
    history: Vec<(u64, Command)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that remembers up to `max_history` drained commands.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Take all pending commands in submission order, recording them in
    /// history under `tick`.
    pub fn drain(&mut self, tick: u64) -> Vec<Command> {
        let commands = std::mem::take(&mut self.pending);

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().map(|cmd| (tick, cmd.clone())));
            let excess = self.history.len().saturating_sub(self.max_history);
            self.history.drain(..excess);
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
