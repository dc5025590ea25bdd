use super::stats::StatsSnapshot;
use serde::Serialize;

/// The states of the battle automation machine.
///
/// Exactly one is current at any time. Only the worker loop changes it, and
/// only through the return value of the active state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BotState {
    Idle,
    Starting,
    SelectingBattle,
    ConfirmingBattle,
    InBattle,
    BattleEnded,
    ConnectionLost,
    Reconnecting,
    Error,
}

impl BotState {
    pub fn name(&self) -> &'static str {
        match self {
            BotState::Idle => "Idle",
            BotState::Starting => "Starting",
            BotState::SelectingBattle => "SelectingBattle",
            BotState::ConfirmingBattle => "ConfirmingBattle",
            BotState::InBattle => "InBattle",
            BotState::BattleEnded => "BattleEnded",
            BotState::ConnectionLost => "ConnectionLost",
            BotState::Reconnecting => "Reconnecting",
            BotState::Error => "Error",
        }
    }
}

/// Notifications the worker pushes to observers.
///
/// Delivery never blocks the worker; a vanished receiver is ignored.
#[derive(Debug, Clone)]
pub enum AutomationEvent {
    StateChanged(BotState),
    Log(log::Level, String),
    Error(String),
    StatsUpdated(StatsSnapshot),
}
