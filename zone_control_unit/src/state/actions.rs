//! Actions executed when a mode is entered.
//!
//! Each mode owns a static action list; the arbiter hands every action of the
//! newly entered mode to a [`ModeActionHandler`].

use zone_common::zone::state::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeAction {
    /// Allow channel enable lines to follow their control law.
    EnableActuators,
    /// Hold every channel enable line low.
    DisableActuators,
    /// Force the brake to full force.
    EngageBrake,
    /// Return brake control to the commanded value.
    ReleaseBrake,
}

/// Receives the actions of a newly entered mode.
pub trait ModeActionHandler {
    fn execute(&mut self, mode: Mode, action: ModeAction);
}

const SAFE_ACTIONS: &[ModeAction] = &[ModeAction::DisableActuators, ModeAction::EngageBrake];
const ACTIVE_ACTIONS: &[ModeAction] = &[ModeAction::EnableActuators, ModeAction::ReleaseBrake];

/// Action lists indexed by [`Mode::ordinal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeActionTable {
    entries: [&'static [ModeAction]; Mode::COUNT],
}

impl Default for ModeActionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeActionTable {
    pub const fn new() -> Self {
        Self {
            entries: [
                SAFE_ACTIONS,   // Startup
                ACTIVE_ACTIONS, // Run
                ACTIVE_ACTIONS, // Degraded
                SAFE_ACTIONS,   // SafeStop
                SAFE_ACTIONS,   // Shutdown
            ],
        }
    }

    /// Replace the action list of one mode.
    pub const fn with(mut self, mode: Mode, actions: &'static [ModeAction]) -> Self {
        self.entries[mode.ordinal() as usize] = actions;
        self
    }

    #[inline]
    pub const fn actions(&self, mode: Mode) -> &'static [ModeAction] {
        self.entries[mode.ordinal() as usize]
    }
}
