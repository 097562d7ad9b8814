//! The installation tree of one account, held in memory between refresh passes.
//!
//! The tree is fetched once and never rebuilt by the refresh passes: installations,
//! gateways and control systems keep their identity, only the zones' status and schedule
//! fields are written.

use log::{debug, info};

use crate::client::EvohomeApi;
use crate::error::EvohomeError;
use crate::models::evohome::{Account, ControlSystem, Installation, Zone, ZoneId};

#[derive(Debug, Clone)]
pub struct Topology {
    account: Account,
    installations: Vec<Installation>,
}

impl Topology {
    /// Fetch the installation tree for `account` and drop every zone with an `Unknown` model
    /// type, in every control system.
    pub fn load<A: EvohomeApi + ?Sized>(api: &A, account: Account) -> Result<Self, EvohomeError> {
        let installations = fetch_installations(api, &account)?;
        Ok(Topology { account, installations })
    }

    pub fn from_parts(account: Account, mut installations: Vec<Installation>) -> Self {
        prune_unknown_zones(&mut installations);
        Topology { account, installations }
    }

    /// Re-fetch the whole tree and replace the held one. Statuses and schedules gathered so
    /// far are discarded with it. On error the held tree is left untouched.
    pub fn reload<A: EvohomeApi + ?Sized>(&mut self, api: &A) -> Result<(), EvohomeError> {
        self.installations = fetch_installations(api, &self.account)?;
        Ok(())
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn installations(&self) -> &[Installation] {
        &self.installations
    }

    pub(crate) fn installations_mut(&mut self) -> &mut [Installation] {
        &mut self.installations
    }

    /// Primary control system of the installation at `index`.
    pub fn control_system(&self, index: usize) -> Result<&ControlSystem, EvohomeError> {
        let installation = self.installation_at(index)?;
        installation
            .primary_control_system()
            .ok_or_else(|| missing_control_system(installation))
    }

    /// Fails on the first installation without a gateway or control system.
    pub fn ensure_primary_control_systems(&self) -> Result<(), EvohomeError> {
        for installation in &self.installations {
            if installation.primary_control_system().is_none() {
                return Err(missing_control_system(installation));
            }
        }
        Ok(())
    }

    /// Zone with `zone_id` in any installation's primary control system.
    pub fn zone(&self, zone_id: &ZoneId) -> Option<&Zone> {
        self.installations
            .iter()
            .filter_map(Installation::primary_control_system)
            .find_map(|system| system.zone(zone_id))
    }

    pub fn zone_mut(&mut self, zone_id: &ZoneId) -> Option<&mut Zone> {
        self.installations
            .iter_mut()
            .filter_map(Installation::primary_control_system_mut)
            .flat_map(|system| system.zones.iter_mut())
            .find(|zone| &zone.zone_id == zone_id)
    }

    /// Every zone of every primary control system, in topology order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.installations
            .iter()
            .filter_map(Installation::primary_control_system)
            .flat_map(|system| system.zones.iter())
    }

    fn installation_at(&self, index: usize) -> Result<&Installation, EvohomeError> {
        self.installations
            .get(index)
            .ok_or_else(|| out_of_range(index, self.installations.len()))
    }
}

fn fetch_installations<A: EvohomeApi + ?Sized>(api: &A, account: &Account) -> Result<Vec<Installation>, EvohomeError> {
    let mut installations = api.get_installations(&account.user_id)?;
    let removed = prune_unknown_zones(&mut installations);
    info!(
        "Topology: loaded {} installation(s) for {} ({} zone(s) with unknown model skipped)",
        installations.len(),
        account.display_name(),
        removed
    );
    Ok(installations)
}

/// Remove zones with an `Unknown` model type from every control system. Returns how many
/// were removed.
pub fn prune_unknown_zones(installations: &mut [Installation]) -> usize {
    let mut removed = 0;
    for installation in installations.iter_mut() {
        let location = installation.location_info.location_id.0.clone();
        for system in installation.control_systems_mut() {
            let before = system.zones.len();
            system.zones.retain(|zone| !zone.is_unknown_model());
            let dropped = before - system.zones.len();
            if dropped > 0 {
                debug!(
                    "Topology: location {} system {} dropped {} unknown zone(s)",
                    location, system.system_id.0, dropped
                );
            }
            removed += dropped;
        }
    }
    removed
}

fn out_of_range(index: usize, count: usize) -> EvohomeError {
    EvohomeError::InvariantViolation(format!(
        "control system index {} out of range ({} installation(s))",
        index, count
    ))
}

fn missing_control_system(installation: &Installation) -> EvohomeError {
    EvohomeError::InvariantViolation(format!(
        "installation {} ({}) has no gateway with a temperature control system",
        installation.location_info.location_id.0, installation.location_info.name
    ))
}
