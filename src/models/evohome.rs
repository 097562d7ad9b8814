//! Wire models for the Evohome EMEA v1 web API.
//!
//! Scope: types only, no HTTP code.
//!
//! Notes
//! - Identifiers are opaque vendor strings wrapped in newtypes.
//! - The installation tree (`location/installationInfo`) and the live status view
//!   (`location/{id}/status`) share ids but differ in shape; both are modeled here.
//! - Time-of-day and `until` fields remain strings.

use serde::{Deserialize, Serialize};

/// Zones reported with this model type are placeholders and never surfaced.
pub const UNKNOWN_MODEL_TYPE: &str = "Unknown";

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

// =====================
// Enums
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetpointMode {
    FollowSchedule,
    PermanentOverride,
    TemporaryOverride,
    #[serde(other)]
    Unrecognised,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

// =====================
// Account
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl Account {
    /// First and last name when the account has them, the username otherwise.
    pub fn display_name(&self) -> String {
        let parts = [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

// =====================
// Installation tree
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub location_info: LocationInfo,
    #[serde(default)]
    pub gateways: Vec<Gateway>,
}

impl Installation {
    /// The first control system of the first gateway.
    ///
    /// Sites with more than one gateway or control system are reduced to this one; the
    /// refresh passes never look past it.
    pub fn primary_control_system(&self) -> Option<&ControlSystem> {
        self.gateways.first()?.temperature_control_systems.first()
    }

    pub fn primary_control_system_mut(&mut self) -> Option<&mut ControlSystem> {
        self.gateways.first_mut()?.temperature_control_systems.first_mut()
    }

    pub fn control_systems_mut(&mut self) -> impl Iterator<Item = &mut ControlSystem> {
        self.gateways
            .iter_mut()
            .flat_map(|g| g.temperature_control_systems.iter_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub location_id: LocationId,
    pub name: String,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub gateway_info: GatewayInfo,
    #[serde(default)]
    pub temperature_control_systems: Vec<ControlSystem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub gateway_id: GatewayId,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default, rename = "isWiFi")]
    pub is_wifi: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSystem {
    pub system_id: SystemId,
    pub model_type: String,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl ControlSystem {
    pub fn zone(&self, zone_id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.zone_id == zone_id)
    }
}

/// A zone as held in the topology.
///
/// Identity fields come from the installation tree and never change; the three optional
/// fields are filled in by the refresh passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub zone_id: ZoneId,
    pub name: String,
    pub model_type: String,
    #[serde(default)]
    pub zone_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_status: Option<TemperatureStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setpoint_status: Option<HeatSetpointStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

impl Zone {
    pub fn is_unknown_model(&self) -> bool {
        self.model_type == UNKNOWN_MODEL_TYPE
    }
}

// =====================
// Live status view
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStatus {
    pub location_id: LocationId,
    #[serde(default)]
    pub gateways: Vec<GatewayStatus>,
}

impl LocationStatus {
    /// Zone statuses of the first control system of the first gateway, mirroring
    /// [`Installation::primary_control_system`]. Empty when the payload has none.
    pub fn primary_zone_statuses(&self) -> &[ZoneStatus] {
        self.gateways
            .first()
            .and_then(|g| g.temperature_control_systems.first())
            .map(|s| s.zones.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub gateway_id: GatewayId,
    #[serde(default)]
    pub temperature_control_systems: Vec<ControlSystemStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSystemStatus {
    pub system_id: SystemId,
    #[serde(default)]
    pub zones: Vec<ZoneStatus>,
    #[serde(default)]
    pub system_mode_status: Option<SystemModeStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemModeStatus {
    pub mode: String,
    #[serde(default)]
    pub is_permanent: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    pub zone_id: ZoneId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub temperature_status: Option<TemperatureStatus>,
    #[serde(default)]
    pub setpoint_status: Option<HeatSetpointStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureStatus {
    pub is_available: bool,
    /// Absent while the sensor is unavailable.
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatSetpointStatus {
    pub target_heat_temperature: f64,
    pub setpoint_mode: SetpointMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

// =====================
// Schedules
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub daily_schedules: Vec<DailySchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    pub day_of_week: DayOfWeek,
    #[serde(default)]
    pub switchpoints: Vec<Switchpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Switchpoint {
    pub heat_setpoint: f64,
    /// `HH:MM:SS`, local to the installation.
    pub time_of_day: String,
}

// =====================
// Write requests
// =====================

/// Body of `PUT temperatureZone/{id}/heatSetpoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeatSetpointRequest {
    pub setpoint_mode: SetpointMode,
    pub heat_setpoint_value: Option<f64>,
    pub time_until: Option<String>,
}

impl HeatSetpointRequest {
    /// Cancel any override and return the zone to its schedule.
    pub fn follow_schedule() -> Self {
        HeatSetpointRequest {
            setpoint_mode: SetpointMode::FollowSchedule,
            heat_setpoint_value: None,
            time_until: None,
        }
    }

    pub fn permanent(target: f64) -> Self {
        HeatSetpointRequest {
            setpoint_mode: SetpointMode::PermanentOverride,
            heat_setpoint_value: Some(target),
            time_until: None,
        }
    }

    /// Override until `until` (UTC), after which the schedule resumes.
    pub fn temporary(target: f64, until: chrono::DateTime<chrono::Utc>) -> Self {
        HeatSetpointRequest {
            setpoint_mode: SetpointMode::TemporaryOverride,
            heat_setpoint_value: Some(target),
            time_until: Some(until.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn load_installations() -> Vec<Installation> {
        let json = std::fs::read_to_string("tests/data/installation-info.json").expect("fixture present");
        serde_json::from_str(&json).expect("parse installation info")
    }

    #[test]
    fn parses_installation_tree() {
        let installations = load_installations();
        assert_eq!(installations.len(), 2);

        let first = &installations[0];
        assert_eq!(first.location_info.location_id, LocationId("1001".into()));
        assert_eq!(first.location_info.name, "Home");
        let system = first.primary_control_system().expect("primary system");
        assert_eq!(system.system_id, SystemId("3001".into()));
        assert_eq!(system.zones.len(), 3);
        assert!(system.zones.iter().all(|z| z.temperature_status.is_none()));
        assert!(system.zones.iter().any(Zone::is_unknown_model));
    }

    #[test]
    fn parses_status_with_unavailable_sensor() {
        let json = std::fs::read_to_string("tests/data/location-status-1001.json").expect("fixture present");
        let status: LocationStatus = serde_json::from_str(&json).expect("parse status");
        let zones = status.primary_zone_statuses();
        assert_eq!(zones.len(), 3);

        let unavailable = zones
            .iter()
            .find(|z| z.zone_id == ZoneId("5099".into()))
            .and_then(|z| z.temperature_status.as_ref())
            .expect("status for 5099");
        assert!(!unavailable.is_available);
        assert_eq!(unavailable.temperature, None);

        let overridden = zones[1].setpoint_status.as_ref().expect("setpoint");
        assert_eq!(overridden.setpoint_mode, SetpointMode::TemporaryOverride);
        assert_eq!(overridden.until.as_deref(), Some("2026-10-18T22:00:00Z"));
    }

    #[test]
    fn unrecognised_setpoint_mode_does_not_fail_decode() {
        let status: HeatSetpointStatus =
            serde_json::from_str(r#"{"targetHeatTemperature": 5.0, "setpointMode": "VacationHold"}"#).unwrap();
        assert_eq!(status.setpoint_mode, SetpointMode::Unrecognised);
    }

    #[test]
    fn status_without_gateways_has_no_zone_statuses() {
        let status: LocationStatus = serde_json::from_str(r#"{"locationId": "1", "gateways": []}"#).unwrap();
        assert!(status.primary_zone_statuses().is_empty());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let mut account: Account =
            serde_json::from_str(r#"{"userId": "42", "username": "jane@example.com"}"#).unwrap();
        assert_eq!(account.display_name(), "jane@example.com");

        account.firstname = Some("Jane".into());
        account.lastname = Some("Doe".into());
        assert_eq!(account.display_name(), "Jane Doe");
    }

    #[test]
    fn heat_setpoint_request_uses_vendor_casing() {
        let until = Utc.with_ymd_and_hms(2026, 10, 18, 22, 0, 0).unwrap();
        let body = serde_json::to_value(HeatSetpointRequest::temporary(21.5, until)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "SetpointMode": "TemporaryOverride",
                "HeatSetpointValue": 21.5,
                "TimeUntil": "2026-10-18T22:00:00Z"
            })
        );

        let body = serde_json::to_value(HeatSetpointRequest::follow_schedule()).unwrap();
        assert_eq!(body["SetpointMode"], "FollowSchedule");
        assert!(body["HeatSetpointValue"].is_null());
    }
}
