//! Supervisor State Machine
//!
//! States are explicit; transitions are event-driven and one-directional:
//! `init -> running -> stopping -> stopped`.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorState {
    Init,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("cannot transition from {from:?} to {to:?}")]
    InvalidTransition { from: SupervisorState, to: SupervisorState },
}

impl SupervisorState {
    pub fn start(self) -> Result<Self, StateError> {
        match self {
            SupervisorState::Init => Ok(SupervisorState::Running),
            other => Err(StateError::InvalidTransition {
                from: other,
                to: SupervisorState::Running,
            }),
        }
    }

    pub fn begin_stopping(self) -> Result<Self, StateError> {
        match self {
            SupervisorState::Running => Ok(SupervisorState::Stopping),
            other => Err(StateError::InvalidTransition {
                from: other,
                to: SupervisorState::Stopping,
            }),
        }
    }

    pub fn finish_stopping(self) -> Result<Self, StateError> {
        match self {
            SupervisorState::Stopping => Ok(SupervisorState::Stopped),
            other => Err(StateError::InvalidTransition {
                from: other,
                to: SupervisorState::Stopped,
            }),
        }
    }
}
