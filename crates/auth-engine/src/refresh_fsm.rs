//! Refresh phase state machine using rust-fsm.
//!
//! One machine per pipeline instance. A refresh may only start from `Idle`,
//! which is what keeps a second exchange from being launched while one is
//! already in flight.
//!
//! ```text
//! ┌──────────┐  RefreshStarted   ┌──────────────┐
//! │   Idle   │ ────────────────► │  Refreshing  │
//! └──────────┘ ◄──────────────── └──────────────┘
//!               RefreshCompleted
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        RefreshStarted => Refreshing
    },
    Refreshing => {
        // Success and failure both end the cycle
        RefreshCompleted => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

/// Phase of the pipeline's refresh slot, for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

impl From<&RefreshMachineState> for RefreshPhase {
    fn from(state: &RefreshMachineState) -> Self {
        match state {
            RefreshMachineState::Idle => RefreshPhase::Idle,
            RefreshMachineState::Refreshing => RefreshPhase::Refreshing,
        }
    }
}
