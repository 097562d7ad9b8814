//! In-memory stand-in for the vendor API, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::client::EvohomeApi;
use crate::error::EvohomeError;
use crate::models::evohome::*;

fn read_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let json = std::fs::read_to_string(format!("tests/data/{name}")).expect("fixture present");
    serde_json::from_str(&json).expect("parse fixture")
}

pub fn load_account() -> Account {
    read_fixture("user-account.json")
}

pub fn load_installations() -> Vec<Installation> {
    read_fixture("installation-info.json")
}

pub fn load_status(location_id: &str) -> LocationStatus {
    read_fixture(&format!("location-status-{location_id}.json"))
}

pub fn load_schedule() -> Schedule {
    read_fixture("zone-schedule.json")
}

pub fn zone_status(zone_id: &str, temperature: f64, target: f64, mode: SetpointMode) -> ZoneStatus {
    ZoneStatus {
        zone_id: ZoneId(zone_id.into()),
        name: None,
        temperature_status: Some(TemperatureStatus {
            is_available: true,
            temperature: Some(temperature),
        }),
        setpoint_status: Some(HeatSetpointStatus {
            target_heat_temperature: target,
            setpoint_mode: mode,
            until: None,
        }),
    }
}

/// Wrap zone statuses in the location status envelope the API returns.
pub fn location_status(location_id: &str, zones: Vec<ZoneStatus>) -> LocationStatus {
    LocationStatus {
        location_id: LocationId(location_id.into()),
        gateways: vec![GatewayStatus {
            gateway_id: GatewayId("gw".into()),
            temperature_control_systems: vec![ControlSystemStatus {
                system_id: SystemId("sys".into()),
                zones,
                system_mode_status: None,
            }],
        }],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Account,
    Installations(UserId),
    LocationStatus(LocationId),
    ZoneSchedule(ZoneId),
    SetHeatSetpoint(ZoneId, HeatSetpointRequest),
    SetSchedule(ZoneId),
}

pub struct FakeApi {
    account: Account,
    installations: RefCell<Vec<Installation>>,
    statuses: RefCell<HashMap<LocationId, LocationStatus>>,
    schedules: RefCell<HashMap<ZoneId, Schedule>>,
    failing_locations: RefCell<HashSet<LocationId>>,
    failing_schedules: RefCell<HashSet<ZoneId>>,
    failing_installations: Cell<bool>,
    rejecting_auth: Cell<bool>,
    status_latency: Cell<Duration>,
    calls: RefCell<Vec<ApiCall>>,
}

impl FakeApi {
    /// Account, tree, statuses for both locations and the same weekly schedule for every zone.
    pub fn from_fixtures() -> Self {
        let installations = load_installations();
        let schedule = load_schedule();
        let schedules = installations
            .iter()
            .flat_map(|i| i.gateways.iter())
            .flat_map(|g| g.temperature_control_systems.iter())
            .flat_map(|s| s.zones.iter())
            .map(|z| (z.zone_id.clone(), schedule.clone()))
            .collect();
        let statuses = ["1001", "1002"]
            .into_iter()
            .map(|id| (LocationId(id.into()), load_status(id)))
            .collect();

        FakeApi {
            account: load_account(),
            installations: RefCell::new(installations),
            statuses: RefCell::new(statuses),
            schedules: RefCell::new(schedules),
            failing_locations: RefCell::new(HashSet::new()),
            failing_schedules: RefCell::new(HashSet::new()),
            failing_installations: Cell::new(false),
            rejecting_auth: Cell::new(false),
            status_latency: Cell::new(Duration::ZERO),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_installations(&self, installations: Vec<Installation>) {
        *self.installations.borrow_mut() = installations;
    }

    pub fn set_status(&self, status: LocationStatus) {
        self.statuses.borrow_mut().insert(status.location_id.clone(), status);
    }

    pub fn set_schedule(&self, zone_id: &str, schedule: Schedule) {
        self.schedules.borrow_mut().insert(ZoneId(zone_id.into()), schedule);
    }

    pub fn fail_location(&self, location_id: &str) {
        self.failing_locations.borrow_mut().insert(LocationId(location_id.into()));
    }

    pub fn fail_schedule(&self, zone_id: &str) {
        self.failing_schedules.borrow_mut().insert(ZoneId(zone_id.into()));
    }

    pub fn fail_installations(&self) {
        self.failing_installations.set(true);
    }

    pub fn reject_auth(&self) {
        self.rejecting_auth.set(true);
    }

    /// Every location status fetch blocks for `latency` before answering.
    pub fn delay_location_status(&self, latency: Duration) {
        self.status_latency.set(latency);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: ApiCall) -> Result<(), EvohomeError> {
        self.calls.borrow_mut().push(call);
        if self.rejecting_auth.get() {
            return Err(EvohomeError::Auth("fake: credentials rejected".to_string()));
        }
        Ok(())
    }
}

impl EvohomeApi for FakeApi {
    fn get_account(&self) -> Result<Account, EvohomeError> {
        self.record(ApiCall::Account)?;
        Ok(self.account.clone())
    }

    fn get_installations(&self, user_id: &UserId) -> Result<Vec<Installation>, EvohomeError> {
        self.record(ApiCall::Installations(user_id.clone()))?;
        if self.failing_installations.get() {
            return Err(EvohomeError::Transport("fake: connection refused".to_string()));
        }
        Ok(self.installations.borrow().clone())
    }

    fn get_location_status(&self, location_id: &LocationId) -> Result<LocationStatus, EvohomeError> {
        self.record(ApiCall::LocationStatus(location_id.clone()))?;
        std::thread::sleep(self.status_latency.get());
        if self.failing_locations.borrow().contains(location_id) {
            return Err(EvohomeError::Transport("fake: connection reset".to_string()));
        }
        self.statuses
            .borrow()
            .get(location_id)
            .cloned()
            .ok_or_else(|| EvohomeError::Http {
                status: 404,
                url: format!("location/{}/status", location_id.0),
                message: String::new(),
            })
    }

    fn get_zone_schedule(&self, zone_id: &ZoneId) -> Result<Schedule, EvohomeError> {
        self.record(ApiCall::ZoneSchedule(zone_id.clone()))?;
        if self.failing_schedules.borrow().contains(zone_id) {
            return Err(EvohomeError::Http {
                status: 500,
                url: format!("temperatureZone/{}/schedule", zone_id.0),
                message: "fake: internal error".to_string(),
            });
        }
        self.schedules
            .borrow()
            .get(zone_id)
            .cloned()
            .ok_or_else(|| EvohomeError::Http {
                status: 404,
                url: format!("temperatureZone/{}/schedule", zone_id.0),
                message: String::new(),
            })
    }

    fn set_zone_heat_setpoint(&self, zone_id: &ZoneId, request: &HeatSetpointRequest) -> Result<(), EvohomeError> {
        self.record(ApiCall::SetHeatSetpoint(zone_id.clone(), request.clone()))
    }

    fn set_zone_schedule(&self, zone_id: &ZoneId, schedule: &Schedule) -> Result<(), EvohomeError> {
        self.record(ApiCall::SetSchedule(zone_id.clone()))?;
        self.schedules.borrow_mut().insert(zone_id.clone(), schedule.clone());
        Ok(())
    }
}
