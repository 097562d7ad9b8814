//! Refresh passes that fold freshly fetched, partial API views into the held topology.
//!
//! Both passes walk every installation's primary control system and match by zone id.
//! A failed fetch for one installation (temperatures) or one zone (schedules) is logged,
//! recorded in the report and skipped; auth failures and broken topology end the pass.

use log::{debug, warn};

use crate::client::EvohomeApi;
use crate::error::EvohomeError;
use crate::models::evohome::{LocationId, Zone, ZoneId, ZoneStatus};
use crate::topology::Topology;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTarget {
    Location(LocationId),
    Zone(ZoneId),
}

#[derive(Debug)]
pub struct RefreshFailure {
    pub target: RefreshTarget,
    pub error: EvohomeError,
}

#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Zones whose fields were replaced by fetched data.
    pub zones_updated: usize,
    /// Zones left with their previous data (absent from the payload, or their fetch failed).
    pub zones_stale: usize,
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn absorb(&mut self, other: RefreshReport) {
        self.zones_updated += other.zones_updated;
        self.zones_stale += other.zones_stale;
        self.failures.extend(other.failures);
    }

    fn record(&mut self, target: RefreshTarget, error: EvohomeError) {
        self.failures.push(RefreshFailure { target, error });
    }
}

/// Replace the temperature and setpoint status of every zone that has an entry in `statuses`.
///
/// Both fields are assigned as fetched, including `None`. Zones without an entry keep what
/// they had; entries without a matching zone are ignored. Returns the number of zones updated.
pub fn merge_zone_statuses(zones: &mut [Zone], statuses: &[ZoneStatus]) -> usize {
    let mut updated = 0;
    for zone in zones.iter_mut() {
        let Some(status) = statuses.iter().find(|s| s.zone_id == zone.zone_id) else {
            continue;
        };
        zone.temperature_status = status.temperature_status.clone();
        zone.setpoint_status = status.setpoint_status.clone();
        updated += 1;
    }
    updated
}

/// Fetch the live status of each installation and merge it into the stored zones.
pub fn refresh_temperatures<A: EvohomeApi + ?Sized>(
    api: &A,
    topology: &mut Topology,
) -> Result<RefreshReport, EvohomeError> {
    topology.ensure_primary_control_systems()?;
    let mut report = RefreshReport::default();

    for installation in topology.installations_mut() {
        let location_id = installation.location_info.location_id.clone();
        let Some(system) = installation.primary_control_system_mut() else {
            continue;
        };

        let status = match api.get_location_status(&location_id) {
            Ok(status) => status,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    "Refresh: temperatures for location {} skipped, keeping previous values: {}",
                    location_id.0, e
                );
                report.zones_stale += system.zones.len();
                report.record(RefreshTarget::Location(location_id), e);
                continue;
            }
        };

        let statuses = status.primary_zone_statuses();
        if statuses.is_empty() {
            warn!("Refresh: status for location {} carries no zones", location_id.0);
        }
        let updated = merge_zone_statuses(&mut system.zones, statuses);
        report.zones_updated += updated;
        report.zones_stale += system.zones.len() - updated;
        debug!(
            "Refresh: location {} temperatures updated for {}/{} zone(s)",
            location_id.0,
            updated,
            system.zones.len()
        );
    }

    Ok(report)
}

/// Fetch every stored zone's weekly schedule, one call per zone.
pub fn refresh_schedules<A: EvohomeApi + ?Sized>(
    api: &A,
    topology: &mut Topology,
) -> Result<RefreshReport, EvohomeError> {
    topology.ensure_primary_control_systems()?;
    let mut report = RefreshReport::default();

    for installation in topology.installations_mut() {
        let Some(system) = installation.primary_control_system_mut() else {
            continue;
        };
        for zone in system.zones.iter_mut() {
            match api.get_zone_schedule(&zone.zone_id) {
                Ok(schedule) => {
                    zone.schedule = Some(schedule);
                    report.zones_updated += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        "Refresh: schedule for zone {} ({}) skipped, keeping previous value: {}",
                        zone.zone_id.0, zone.name, e
                    );
                    report.zones_stale += 1;
                    report.record(RefreshTarget::Zone(zone.zone_id.clone()), e);
                }
            }
        }
    }

    debug!(
        "Refresh: schedules updated for {} zone(s), {} failure(s)",
        report.zones_updated,
        report.failures.len()
    );
    Ok(report)
}

/// Schedules first, then temperatures.
pub fn refresh_all<A: EvohomeApi + ?Sized>(api: &A, topology: &mut Topology) -> Result<RefreshReport, EvohomeError> {
    let mut report = refresh_schedules(api, topology)?;
    report.absorb(refresh_temperatures(api, topology)?);
    Ok(report)
}
