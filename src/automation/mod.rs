// The recognition-driven control loop: a finite state machine running on a
// single worker task, fed by the vision layer, acting through the device
// transport, and reporting to observers through an event channel.

pub mod channels;
pub mod config;
pub mod controller;
pub mod engine;
pub mod stats;
pub mod types;


pub use channels::event_channel;
pub use config::{ClickMap, EngineConfig, MarkerSet};
pub use controller::BotController;
pub use engine::{BotEngine, EngineError};
pub use stats::{RunStats, StatsSnapshot};
pub use types::{AutomationEvent, BotState};
