use crate::models::evohome::Zone;
use serde::Serialize;

/// Serialize a serde-backed enum into its string name (e.g. `FollowSchedule`).
pub fn serde_enum_name<T: Serialize>(val: &T) -> Option<String> {
    serde_json::to_value(val).ok()?.as_str().map(|s| s.to_string())
}

/// One-line reading of a zone, e.g. `Lounge: 19.5°C -> 21.0°C (FollowSchedule)`.
pub fn zone_summary(zone: &Zone) -> String {
    let measured = match zone.temperature_status.as_ref() {
        Some(t) if t.is_available => t
            .temperature
            .map(|c| format!("{:.1}°C", c))
            .unwrap_or_else(|| "-".to_string()),
        Some(_) => "unavailable".to_string(),
        None => "-".to_string(),
    };
    let target = match zone.setpoint_status.as_ref() {
        Some(s) => format!(
            "{:.1}°C ({})",
            s.target_heat_temperature,
            serde_enum_name(&s.setpoint_mode).unwrap_or_else(|| "?".to_string())
        ),
        None => "-".to_string(),
    };
    format!("{}: {} -> {}", zone.name, measured, target)
}
