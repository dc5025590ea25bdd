// The state machine worker. One handler per state; each handler observes the
// screen, taps, and returns the next state. The worker loop is the only
// writer of the current state and the run counters.

use super::config::{ClickPoint, EngineConfig};
use super::stats::RunStats;
use super::types::{AutomationEvent, BotState};
use crate::device::{DeviceControl, DeviceError};
use crate::vision::{wait_for_any, TemplateMatcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;

/// Failures that escape a state handler.
///
/// They are caught once, at the loop boundary: the `errors` counter is
/// bumped, an error event goes out, and the machine moves to `Error`. The
/// worker itself never dies from one.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Device transport failure: {0}")]
    Device(#[from] DeviceError),
}

pub struct BotEngine<D> {
    device: Arc<D>,
    matcher: Arc<TemplateMatcher>,
    config: Arc<EngineConfig>,
    stats: Arc<RunStats>,
    running: Arc<AtomicBool>,
    events: UnboundedSender<AutomationEvent>,
    state: BotState,
}

impl<D: DeviceControl> BotEngine<D> {
    pub(crate) fn new(
        device: Arc<D>,
        matcher: Arc<TemplateMatcher>,
        config: Arc<EngineConfig>,
        stats: Arc<RunStats>,
        running: Arc<AtomicBool>,
        events: UnboundedSender<AutomationEvent>,
    ) -> Self {
        Self {
            device,
            matcher,
            config,
            stats,
            running,
            events,
            state: BotState::Starting,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    /// Worker loop. Runs until the run flag is cleared, then resets to Idle
    /// and notifies observers.
    pub async fn run(mut self) {
        log::info!("Automation loop started");
        while self.running.load(Ordering::SeqCst) {
            match self.dispatch().await {
                Ok(next) => self.change_state(next),
                Err(e) => {
                    self.stats.record_error();
                    self.emit(AutomationEvent::Error(e.to_string()));
                    self.emit(AutomationEvent::StatsUpdated(self.stats.snapshot()));
                    log::error!("Handler for {:?} failed: {e}", self.state);
                    self.change_state(BotState::Error);
                }
            }
            sleep(self.config.tick).await;
        }

        self.running.store(false, Ordering::SeqCst);
        self.change_state(BotState::Idle);
        log::info!("Automation loop stopped");
    }

    async fn dispatch(&mut self) -> Result<BotState, EngineError> {
        // Exhaustive over BotState: a state without a handler cannot compile.
        match self.state {
            BotState::Idle => self.handle_idle().await,
            BotState::Starting => self.handle_starting().await,
            BotState::SelectingBattle => self.handle_selecting_battle().await,
            BotState::ConfirmingBattle => self.handle_confirming_battle().await,
            BotState::InBattle => self.handle_in_battle().await,
            BotState::BattleEnded => self.handle_battle_ended().await,
            BotState::ConnectionLost => self.handle_connection_lost().await,
            BotState::Reconnecting => self.handle_reconnecting().await,
            BotState::Error => self.handle_error().await,
        }
    }

    fn change_state(&mut self, next: BotState) {
        if self.state != next {
            log::info!("State transition: {} -> {}", self.state.name(), next.name());
            self.state = next;
            self.emit(AutomationEvent::StateChanged(next));
        }
    }

    fn emit(&self, event: AutomationEvent) {
        // Observers may be gone; that is never the worker's problem.
        let _ = self.events.send(event);
    }

    fn emit_log(&self, level: log::Level, message: impl Into<String>) {
        let message = message.into();
        log::log!(level, "{message}");
        self.emit(AutomationEvent::Log(level, message));
    }

    fn emit_stats(&self) {
        self.emit(AutomationEvent::StatsUpdated(self.stats.snapshot()));
    }

    /// Both "waiting for server" and "contact us" screens mean the game has
    /// lost its server connection.
    fn connection_issues(&self, screen: &[u8]) -> bool {
        let markers = &self.config.markers;
        if self
            .matcher
            .find_in_screen(screen, &markers.waiting_for_server)
            .is_some()
        {
            self.emit_log(log::Level::Warn, "'Waiting for server' message detected");
            return true;
        }
        if self
            .matcher
            .find_in_screen(screen, &markers.contact_us)
            .is_some()
        {
            self.emit_log(log::Level::Warn, "'Contact us' button detected");
            return true;
        }
        false
    }

    async fn tap(&self, point: ClickPoint) -> Result<(), EngineError> {
        log::debug!("Tap at ({}, {})", point.x, point.y);
        self.device.tap(point.x, point.y).await?;
        Ok(())
    }

    pub(crate) async fn handle_idle(&self) -> Result<BotState, EngineError> {
        sleep(self.config.idle_tick).await;
        Ok(BotState::Idle)
    }

    /// Probe for any known screen, in a fixed order. The order is the
    /// recovery priority: battle selection first, battle results last.
    pub(crate) async fn handle_starting(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Info, "Probing for a known screen...");
        let markers = &self.config.markers;

        match self.device.capture_screen().await {
            Ok(screen) => {
                if self.connection_issues(&screen) {
                    return Ok(BotState::ConnectionLost);
                }
                if self.matcher.find_in_screen(&screen, &markers.select_battle).is_some() {
                    self.emit_log(log::Level::Info, "Battle selection screen found");
                    return Ok(BotState::SelectingBattle);
                }
                if self.matcher.find_in_screen(&screen, &markers.confirm_battle).is_some() {
                    self.emit_log(log::Level::Info, "Battle confirmation screen found");
                    return Ok(BotState::ConfirmingBattle);
                }
                if self.matcher.find_in_screen(&screen, &markers.in_battle).is_some() {
                    self.emit_log(log::Level::Info, "Battle screen found");
                    return Ok(BotState::InBattle);
                }
                if self.matcher.find_in_screen(&screen, &markers.victory).is_some()
                    || self.matcher.find_in_screen(&screen, &markers.defeat).is_some()
                {
                    self.emit_log(log::Level::Info, "Battle result screen found");
                    return Ok(BotState::BattleEnded);
                }
                self.emit_log(log::Level::Warn, "No known screen recognized");
            }
            Err(e) => {
                self.emit_log(log::Level::Error, format!("Screen capture failed: {e}"));
            }
        }

        sleep(self.config.probe_retry).await;
        Ok(BotState::Starting)
    }

    pub(crate) async fn handle_selecting_battle(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Info, "Selecting battle");
        self.tap(self.config.clicks.start_battle).await?;
        sleep(self.config.select_settle).await;
        Ok(BotState::ConfirmingBattle)
    }

    pub(crate) async fn handle_confirming_battle(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Info, "Confirming battle");
        self.tap(self.config.clicks.confirm_battle).await?;
        self.stats.record_battle_started();
        self.emit_stats();

        let found = wait_for_any(
            self.device.as_ref(),
            &self.matcher,
            &[self.config.markers.in_battle.as_str()],
            self.config.confirm_wait,
            self.config.poll_interval,
        )
        .await;
        if found.is_some() {
            return Ok(BotState::InBattle);
        }

        self.emit_log(log::Level::Error, "Auto battle button never appeared");
        if let Ok(screen) = self.device.capture_screen().await
            && self.connection_issues(&screen)
        {
            return Ok(BotState::ConnectionLost);
        }
        Ok(BotState::Error)
    }

    pub(crate) async fn handle_in_battle(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Info, "In battle, enabling auto battle");
        self.tap(self.config.clicks.auto_battle).await?;

        let markers = &self.config.markers;
        let found = wait_for_any(
            self.device.as_ref(),
            &self.matcher,
            &[markers.victory.as_str(), markers.defeat.as_str()],
            self.config.battle_wait,
            self.config.poll_interval,
        )
        .await;
        if found.is_some() {
            return Ok(BotState::BattleEnded);
        }

        if let Ok(screen) = self.device.capture_screen().await
            && self.connection_issues(&screen)
        {
            return Ok(BotState::ConnectionLost);
        }

        self.emit_log(log::Level::Warn, "Battle seems stuck, running emergency recovery");
        self.perform_emergency_clicks().await?;
        Ok(BotState::Starting)
    }

    pub(crate) async fn handle_battle_ended(&self) -> Result<BotState, EngineError> {
        let screen = match self.device.capture_screen().await {
            Ok(screen) => screen,
            Err(e) => {
                self.emit_log(log::Level::Error, format!("Screen capture failed: {e}"));
                return Ok(BotState::Error);
            }
        };
        let markers = &self.config.markers;

        if self.matcher.find_in_screen(&screen, &markers.victory).is_some() {
            self.emit_log(log::Level::Info, "Victory! Continuing to the next battle");
            self.stats.record_victory();
            self.emit_stats();
            self.tap(self.config.clicks.exit_after_win).await?;
            sleep(self.config.victory_settle).await;
            return Ok(BotState::Starting);
        }

        if self.matcher.find_in_screen(&screen, &markers.defeat).is_some() {
            self.emit_log(log::Level::Info, "Defeat. Refreshing opponents and retrying");
            self.stats.record_defeat();
            self.emit_stats();
            self.tap(self.config.clicks.exit_after_win).await?;
            sleep(self.config.defeat_settle).await;
            self.tap(self.config.clicks.refresh_opponents).await?;
            sleep(self.config.refresh_settle).await;
            return Ok(BotState::Starting);
        }

        // Result screen already gone; a full re-probe sorts it out.
        Ok(BotState::Starting)
    }

    pub(crate) async fn handle_connection_lost(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Warn, "Connection to server lost, reconnecting");
        self.stats.record_connection_loss();
        self.emit_stats();

        let screen = match self.device.capture_screen().await {
            Ok(screen) => screen,
            Err(e) => {
                self.emit_log(log::Level::Error, format!("Screen capture failed: {e}"));
                return Ok(BotState::Error);
            }
        };

        let contact_us = self.config.markers.contact_us.as_str();
        let visible = self.matcher.find_in_screen(&screen, contact_us).is_some()
            || wait_for_any(
                self.device.as_ref(),
                &self.matcher,
                &[contact_us],
                self.config.contact_us_wait,
                self.config.poll_interval,
            )
            .await
            .is_some();

        if visible {
            self.tap(self.config.clicks.reconnect_button).await?;
            sleep(self.config.reconnect_settle).await;
            Ok(BotState::Reconnecting)
        } else {
            self.emit_log(log::Level::Error, "Reconnect button never appeared");
            Ok(BotState::Error)
        }
    }

    /// Priority cascade after a reconnect: battle selection screens first,
    /// then battle results, then an ongoing battle, else full re-probe.
    pub(crate) async fn handle_reconnecting(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Info, "Reconnected, determining game state");
        let markers = &self.config.markers;
        let timeout = self.config.reconnect_probe;
        let poll = self.config.reconnect_poll;

        if let Some((name, _)) = wait_for_any(
            self.device.as_ref(),
            &self.matcher,
            &[markers.select_battle.as_str(), markers.confirm_battle.as_str()],
            timeout,
            poll,
        )
        .await
        {
            return Ok(if name == markers.select_battle {
                BotState::SelectingBattle
            } else {
                BotState::ConfirmingBattle
            });
        }

        if wait_for_any(
            self.device.as_ref(),
            &self.matcher,
            &[markers.victory.as_str(), markers.defeat.as_str()],
            timeout,
            poll,
        )
        .await
        .is_some()
        {
            return Ok(BotState::BattleEnded);
        }

        if wait_for_any(
            self.device.as_ref(),
            &self.matcher,
            &[markers.in_battle.as_str()],
            timeout,
            poll,
        )
        .await
        .is_some()
        {
            return Ok(BotState::InBattle);
        }

        self.emit_log(
            log::Level::Warn,
            "Could not determine game state after reconnect, restarting",
        );
        Ok(BotState::Starting)
    }

    pub(crate) async fn handle_error(&self) -> Result<BotState, EngineError> {
        self.emit_log(log::Level::Error, "Bot hit an error, attempting recovery");
        sleep(self.config.error_delay).await;
        Ok(BotState::Starting)
    }

    async fn perform_emergency_clicks(&self) -> Result<(), EngineError> {
        for click in &self.config.clicks.emergency {
            self.tap(click.point).await?;
            sleep(click.settle).await;
        }
        Ok(())
    }
}
