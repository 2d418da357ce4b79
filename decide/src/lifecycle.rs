use crate::*;
use std::fmt;
use std::str::FromStr;

/// An administrative lifecycle action.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
    Tally,
}

impl FromStr for Action {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Action::Start),
            "stop" => Ok(Action::Stop),
            "tally" => Ok(Action::Tally),
            _ => Err(StateError::InvalidAction(s.to_owned())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Tally => "tally",
        };
        f.write_str(name)
    }
}

impl Action {
    /// The state an action leads to from `current`, or why it can't be taken.
    ///
    /// States only move forward; every backwards or repeated action is rejected.
    pub fn target(self, current: VotingState) -> Result<VotingState, StateError> {
        use VotingState::*;

        match (self, current) {
            (Action::Start, Created) => Ok(Started),
            (Action::Start, _) => Err(StateError::AlreadyStarted),

            (Action::Stop, Created) => Err(StateError::NotStarted),
            (Action::Stop, Started) => Ok(Stopped),
            (Action::Stop, _) => Err(StateError::AlreadyStopped),

            (Action::Tally, Created) => Err(StateError::NotStarted),
            (Action::Tally, Started) => Err(StateError::NotStopped),
            (Action::Tally, Stopped) => Ok(Tallied),
            (Action::Tally, Tallied) => Err(StateError::AlreadyTallied),
        }
    }

    /// Message reported when the action succeeds
    pub fn success_message(self) -> &'static str {
        match self {
            Action::Start => "Voting started",
            Action::Stop => "Voting stopped",
            Action::Tally => "Voting tallied",
        }
    }
}

/// Result of a successful transition
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub voting: VotingId,
    pub action: Action,
    pub from: VotingState,
    pub to: VotingState,
    pub message: String,
}
