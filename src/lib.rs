pub mod args;
pub mod automation;
pub mod device;
pub mod vision;

#[cfg(test)]
pub(crate) mod testutil;

pub use automation::{AutomationEvent, BotController, BotState, EngineConfig, StatsSnapshot};
pub use device::{AdbShell, DeviceControl};
pub use vision::{TemplateMatcher, TemplateStore};
