use crate::client::EvohomeApi;
use crate::error::EvohomeError;
use crate::evohome::Evohome;
use crate::services::refresh::RefreshReport;
use crate::utils::zone_summary;
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

/// A fixed-interval deadline that skips missed ticks instead of bursting to catch up.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    interval: Duration,
    next_due: Instant,
}

impl Cadence {
    /// First tick one `interval` after `start`.
    pub fn new(interval: Duration, start: Instant) -> Self {
        Cadence {
            interval,
            next_due: start + interval,
        }
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn advance(&mut self, now: Instant) {
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
    }
}

/// Poll until a fatal error, or until `max_cycles` ticks have run when set.
///
/// The first tick is a full refresh. After that, schedules and temperatures keep their
/// own cadence; a tick where both are due runs schedules first.
pub fn run_loop<A: EvohomeApi>(
    evohome: &mut Evohome<A>,
    temperature_interval: Duration,
    schedule_interval: Duration,
    max_cycles: Option<u64>,
) -> Result<(), EvohomeError> {
    let report = evohome.refresh_all()?;
    log_report("initial", &report);
    log_zones(evohome);

    let start = Instant::now();
    let mut temperatures = Cadence::new(temperature_interval, start);
    let mut schedules = Cadence::new(schedule_interval, start);
    let mut cycles: u64 = 1;

    loop {
        if max_cycles.is_some_and(|max| cycles >= max) {
            info!("Poller: stopping after {} cycle(s)", cycles);
            return Ok(());
        }

        let wake = temperatures.next_due().min(schedules.next_due());
        let now = Instant::now();
        if wake > now {
            thread::sleep(wake - now);
        }

        // Both due checks use the wake-up instant; each advance uses the time its pass finished.
        let woke = Instant::now();
        let temperatures_due = temperatures.is_due(woke);
        if schedules.is_due(woke) {
            let report = evohome.refresh_schedules()?;
            log_report("schedules", &report);
            schedules.advance(Instant::now());
        }
        if temperatures_due {
            let report = evohome.refresh_temperatures()?;
            log_report("temperatures", &report);
            log_zones(evohome);
            temperatures.advance(Instant::now());
        }
        cycles += 1;
    }
}

fn log_report(pass: &str, report: &RefreshReport) {
    if report.is_clean() {
        debug!(
            "Poller: {} pass updated {} zone(s) ({} stale)",
            pass, report.zones_updated, report.zones_stale
        );
        return;
    }
    warn!(
        "Poller: {} pass updated {} zone(s), {} stale, {} failure(s)",
        pass,
        report.zones_updated,
        report.zones_stale,
        report.failures.len()
    );
}

fn log_zones<A: EvohomeApi>(evohome: &Evohome<A>) {
    for installation in evohome.installations() {
        let Some(system) = installation.primary_control_system() else {
            continue;
        };
        for zone in &system.zones {
            debug!("{} / {}", installation.location_info.name, zone_summary(zone));
        }
    }
}
