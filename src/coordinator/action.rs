use std::fmt;
use std::str::FromStr;
use crate::error::ActionParseError;

/// Transport controls an external surface (media notification, remote,
/// key binding) can send to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportAction {
    Play,
    Pause,
    Next,
    Prev,
    Loop,
    Shuffle,
    Stop,
}

impl TransportAction {
    pub const ALL: [TransportAction; 7] = [
        TransportAction::Play,
        TransportAction::Pause,
        TransportAction::Next,
        TransportAction::Prev,
        TransportAction::Loop,
        TransportAction::Shuffle,
        TransportAction::Stop,
    ];

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportAction::Play => "ACTION_PLAY",
            TransportAction::Pause => "ACTION_PAUSE",
            TransportAction::Next => "ACTION_NEXT",
            TransportAction::Prev => "ACTION_PREV",
            TransportAction::Loop => "ACTION_LOOP",
            TransportAction::Shuffle => "ACTION_SHUFFLE",
            TransportAction::Stop => "ACTION_STOP",
        }
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportAction {
    type Err = ActionParseError;

    /// Accepts the wire names and their short forms, in any case
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ActionParseError::Empty);
        }

        let lowered = trimmed.to_ascii_lowercase();
        let name = lowered.strip_prefix("action_").unwrap_or(&lowered);
        match name {
            "play" => Ok(TransportAction::Play),
            "pause" => Ok(TransportAction::Pause),
            "next" => Ok(TransportAction::Next),
            "prev" | "previous" => Ok(TransportAction::Prev),
            "loop" => Ok(TransportAction::Loop),
            "shuffle" => Ok(TransportAction::Shuffle),
            "stop" => Ok(TransportAction::Stop),
            _ => Err(ActionParseError::UnknownAction {
                action: trimmed.to_string(),
            }),
        }
    }
}
