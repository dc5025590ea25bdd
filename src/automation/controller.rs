use super::channels::event_channel;
use super::config::EngineConfig;
use super::engine::BotEngine;
use super::stats::{RunStats, StatsSnapshot};
use super::types::AutomationEvent;
use crate::device::DeviceControl;
use crate::vision::{TemplateMatcher, TemplateStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Handle for driving the automation worker from the outside.
///
/// At most one worker runs at a time; `start`/`stop` toggle the shared run
/// flag, the worker observes it at the top of every iteration. Everything
/// else flows out through the event channel and the stats snapshot.
pub struct BotController<D> {
    device: Arc<D>,
    matcher: Arc<TemplateMatcher>,
    config: Arc<EngineConfig>,
    stats: Arc<RunStats>,
    running: Arc<AtomicBool>,
    events: UnboundedSender<AutomationEvent>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<D: DeviceControl> BotController<D> {
    /// Build a controller and hand back the receiving end of its event
    /// channel.
    pub fn new(device: D, config: EngineConfig) -> (Self, UnboundedReceiver<AutomationEvent>) {
        let store = TemplateStore::new(config.template_dir.clone());
        let matcher = TemplateMatcher::new(store, config.match_threshold);
        let (events, event_rx) = event_channel();
        let controller = Self {
            device: Arc::new(device),
            matcher: Arc::new(matcher),
            config: Arc::new(config),
            stats: Arc::new(RunStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            events,
            worker: Mutex::new(None),
        };
        (controller, event_rx)
    }

    /// Start the worker. Returns false (with an error event) when the bot is
    /// already running or the device fails its connectivity pre-check.
    pub async fn start(&self) -> bool {
        if self.running.load(Ordering::SeqCst) {
            log::warn!("Bot is already running, ignoring start");
            return false;
        }

        // Reap the previous worker before flipping the flag again, so an old
        // loop winding down can never observe the new run's flag.
        let previous = self.worker.lock().expect("worker handle poisoned").take();
        if let Some(handle) = previous {
            let _ = handle.await;
        }

        if !self.device.check_connection().await {
            let message = "Device not connected. Check emulator/ADB settings!".to_string();
            log::error!("{message}");
            let _ = self.events.send(AutomationEvent::Error(message));
            return false;
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let engine = BotEngine::new(
            Arc::clone(&self.device),
            Arc::clone(&self.matcher),
            Arc::clone(&self.config),
            Arc::clone(&self.stats),
            Arc::clone(&self.running),
            self.events.clone(),
        );
        let handle = tokio::spawn(engine.run());
        *self.worker.lock().expect("worker handle poisoned") = Some(handle);
        log::info!("Bot started");
        true
    }

    /// Request cooperative shutdown. The worker exits within one loop
    /// iteration and resets its state to Idle.
    pub fn stop(&self) -> bool {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            log::info!("Bot stop requested");
            true
        } else {
            false
        }
    }

    /// Wait for the worker task to finish after a `stop`.
    pub async fn join(&self) {
        let handle = self.worker.lock().expect("worker handle poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Point-in-time copy of the run counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
