//! Account-level handle: login, topology, refresh passes and zone writes.

use log::info;
use std::time::Duration;

use crate::client::{Credentials, Endpoints, EvohomeApi, EvohomeClient};
use crate::error::EvohomeError;
use crate::models::evohome::{Account, ControlSystem, HeatSetpointRequest, Installation, Schedule, Zone, ZoneId};
use crate::services::refresh::{self, RefreshReport};
use crate::topology::Topology;

pub struct Evohome<A: EvohomeApi = EvohomeClient> {
    api: A,
    topology: Topology,
}

impl Evohome<EvohomeClient> {
    /// Log in against the vendor API and load the account's topology.
    ///
    /// Nothing is returned unless both the login and the topology load succeed.
    pub fn initialize(credentials: Credentials, endpoints: Endpoints, timeout: Duration) -> Result<Self, EvohomeError> {
        let client = EvohomeClient::login(credentials, endpoints, timeout)?;
        Self::with_api(client)
    }
}

impl<A: EvohomeApi> Evohome<A> {
    /// Load account and topology through an already authenticated API.
    pub fn with_api(api: A) -> Result<Self, EvohomeError> {
        let account = api.get_account()?;
        info!("Account: {} ({})", account.display_name(), account.user_id.0);
        let topology = Topology::load(&api, account)?;
        Ok(Evohome { api, topology })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn account(&self) -> &Account {
        self.topology.account()
    }

    pub fn installations(&self) -> &[Installation] {
        self.topology.installations()
    }

    /// Primary control system of the installation at `index`.
    pub fn control_system(&self, index: usize) -> Result<&ControlSystem, EvohomeError> {
        self.topology.control_system(index)
    }

    /// Primary control system of the first installation.
    pub fn primary_control_system(&self) -> Result<&ControlSystem, EvohomeError> {
        self.control_system(0)
    }

    pub fn zone(&self, zone_id: &ZoneId) -> Option<&Zone> {
        self.topology.zone(zone_id)
    }

    pub fn refresh_temperatures(&mut self) -> Result<RefreshReport, EvohomeError> {
        refresh::refresh_temperatures(&self.api, &mut self.topology)
    }

    pub fn refresh_schedules(&mut self) -> Result<RefreshReport, EvohomeError> {
        refresh::refresh_schedules(&self.api, &mut self.topology)
    }

    pub fn refresh_all(&mut self) -> Result<RefreshReport, EvohomeError> {
        refresh::refresh_all(&self.api, &mut self.topology)
    }

    /// Re-fetch the installation tree, dropping all gathered statuses and schedules.
    pub fn reload_topology(&mut self) -> Result<(), EvohomeError> {
        self.topology.reload(&self.api)
    }

    /// Send a setpoint change for a known zone. The held zone is not touched; the next
    /// temperature refresh reports the new state.
    pub fn set_zone_heat_setpoint(&self, zone_id: &ZoneId, request: &HeatSetpointRequest) -> Result<(), EvohomeError> {
        let zone = self.known_zone(zone_id)?;
        info!(
            "Zone {} ({}): setting {:?} {:?}",
            zone.zone_id.0, zone.name, request.setpoint_mode, request.heat_setpoint_value
        );
        self.api.set_zone_heat_setpoint(zone_id, request)
    }

    /// Upload a weekly schedule for a known zone. The held schedule is replaced on the next
    /// schedule refresh.
    pub fn set_zone_schedule(&self, zone_id: &ZoneId, schedule: &Schedule) -> Result<(), EvohomeError> {
        let zone = self.known_zone(zone_id)?;
        info!(
            "Zone {} ({}): uploading schedule for {} day(s)",
            zone.zone_id.0,
            zone.name,
            schedule.daily_schedules.len()
        );
        self.api.set_zone_schedule(zone_id, schedule)
    }

    fn known_zone(&self, zone_id: &ZoneId) -> Result<&Zone, EvohomeError> {
        self.topology
            .zone(zone_id)
            .ok_or_else(|| EvohomeError::InvariantViolation(format!("zone {} is not part of the topology", zone_id.0)))
    }
}
