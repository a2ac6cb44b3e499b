//! ECU operating-mode arbiter.
//!
//! Modes are ordered by severity: Startup < Run < Degraded < SafeStop < Shutdown.
//! A request is accepted when it names the current mode, or when it moves
//! strictly forward from a non-terminal mode (Startup may only go to Run).
//! The arbiter never inspects fault state; every change is requested.

use tracing::debug;
use zone_common::zone::state::Mode;

use super::actions::{ModeActionHandler, ModeActionTable};

/// Result of a mode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    /// Request accepted; mode after the request.
    Accepted(Mode),
    /// Request rejected; mode unchanged.
    Rejected(&'static str),
}

impl ModeTransition {
    #[inline]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Transition rule, usable in const context.
pub const fn is_transition_valid(current: Mode, requested: Mode) -> bool {
    let cur = current.ordinal();
    let req = requested.ordinal();
    if cur == req {
        return true;
    }
    !matches!(current, Mode::Shutdown)
        && req > cur
        && (!matches!(current, Mode::Startup) || matches!(requested, Mode::Run))
}

#[derive(Debug, Clone)]
pub struct ModeArbiter {
    mode: Mode,
    table: ModeActionTable,
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeArbiter {
    pub const fn new() -> Self {
        Self::with_table(ModeActionTable::new())
    }

    pub const fn with_table(table: ModeActionTable) -> Self {
        Self {
            mode: Mode::Startup,
            table,
        }
    }

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub const fn table(&self) -> &ModeActionTable {
        &self.table
    }

    /// Apply a mode request.
    pub fn request(&mut self, requested: Mode) -> ModeTransition {
        if !is_transition_valid(self.mode, requested) {
            return ModeTransition::Rejected(rejection_reason(self.mode, requested));
        }
        if requested != self.mode {
            debug!(from = ?self.mode, to = ?requested, "mode transition");
        }
        self.mode = requested;
        ModeTransition::Accepted(requested)
    }

    /// Run the action list of the current mode.
    pub fn dispatch(&self, handler: &mut dyn ModeActionHandler) {
        for &action in self.table.actions(self.mode) {
            handler.execute(self.mode, action);
        }
    }

    /// Request a mode and, on an actual change, dispatch its actions.
    pub fn transition(
        &mut self,
        requested: Mode,
        handler: &mut dyn ModeActionHandler,
    ) -> ModeTransition {
        let previous = self.mode;
        let result = self.request(requested);
        if result.is_accepted() && self.mode != previous {
            self.dispatch(handler);
        }
        result
    }
}

fn rejection_reason(current: Mode, requested: Mode) -> &'static str {
    match current {
        Mode::Shutdown => "Shutdown is terminal",
        Mode::Startup => "Startup: only Run allowed",
        _ if requested < current => "backward transitions are not allowed",
        _ => "invalid transition",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
