use adb_battle_bot::args::Args;
use adb_battle_bot::automation::{AutomationEvent, BotController, EngineConfig};
use adb_battle_bot::device::AdbShell;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };

    let filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };
    if let Some(dir) = args.templates {
        config.template_dir = dir;
    }

    let device = match &args.device {
        Some(serial) => AdbShell::connect(serial).await,
        None => AdbShell::connect_first().await,
    };
    let device = match device {
        Ok(device) => device,
        Err(e) => {
            log::error!("Could not open device: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (controller, mut events) = BotController::new(device, config);

    // Drain the event channel; log lines and state changes are already on
    // the log, stats snapshots get echoed so progress is visible.
    let observer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let AutomationEvent::StatsUpdated(snap) = event {
                log::info!(
                    "Stats: battles={} victories={} defeats={} disconnects={} errors={}",
                    snap.battles_started,
                    snap.victories,
                    snap.defeats,
                    snap.connection_losses,
                    snap.errors
                );
            }
        }
    });

    if !controller.start().await {
        log::error!("Bot refused to start");
        return ExitCode::FAILURE;
    }

    log::info!("Bot running, press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to wait for Ctrl-C: {e}");
    }

    controller.stop();
    controller.join().await;
    observer.abort();

    let snap = controller.snapshot();
    log::info!(
        "Final stats: battles={} victories={} defeats={} disconnects={} errors={}",
        snap.battles_started,
        snap.victories,
        snap.defeats,
        snap.connection_losses,
        snap.errors
    );
    ExitCode::SUCCESS
}
