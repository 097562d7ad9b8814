use evohome_monitor::config::Config;
use evohome_monitor::env_file::init_env_and_logging;
use evohome_monitor::services::poller;
use evohome_monitor::Evohome;
use log::{error, info};

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (host={}, temperature_interval={}s, schedule_interval={}s, request_timeout={}s, max_poll_cycles={})",
        cfg.host,
        cfg.temperature_interval.as_secs(),
        cfg.schedule_interval.as_secs(),
        cfg.request_timeout.as_secs(),
        cfg.max_poll_cycles
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    // 2) Log in and load the installation tree
    let mut evohome = Evohome::initialize(cfg.credentials.clone(), cfg.endpoints(), cfg.request_timeout)
        .map_err(|e| format!("Evohome initialisation failed: {}", e))?;
    let zone_count = evohome.topology().zones().count();
    info!(
        "Discovered {} installation(s) with {} zone(s)",
        evohome.installations().len(),
        zone_count
    );
    if evohome.installations().is_empty() {
        return Err("No installations found; ensure the account has a location".into());
    }
    let primary = evohome
        .primary_control_system()
        .map_err(|e| format!("No usable control system: {}", e))?;
    info!("Primary control system {} ({})", primary.system_id.0, primary.model_type);

    // 3) Poll (steady cadence)
    info!(
        "Starting poller: temperatures every {}s, schedules every {}s",
        cfg.temperature_interval.as_secs(),
        cfg.schedule_interval.as_secs()
    );
    poller::run_loop(
        &mut evohome,
        cfg.temperature_interval,
        cfg.schedule_interval,
        cfg.max_poll_cycles,
    )
    .map_err(|e| format!("Polling stopped: {}", e))
}

fn main() {
    if let Err(err) = init_env_and_logging() {
        eprintln!("fatal: {}", err);
        std::process::exit(1);
    }

    info!(
        "evohome-monitor {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
