use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Power types counted as renewable generation
pub const RENEWABLE_KINDS: [&str; 4] = ["wind", "solar", "hydro", "geothermal"];

/// Current output and installed capacity of one kind of generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerType {
    pub generation_mw: f64,
    pub capacity_mw: f64,
}

impl PowerType {
    /// Share of capacity currently generating, `None` without capacity
    pub fn utilisation(&self) -> Option<f64> {
        (self.capacity_mw > 0.0).then(|| self.generation_mw / self.capacity_mw)
    }
}

/// Snapshot of national generation by power type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerStationsResponse {
    /// ISO-8601 timestamp, kept exactly as the server sent it
    pub timestamp: String,

    pub power_types: BTreeMap<String, PowerType>,

    /// Emissions in tonnes CO2e per hour (the API spells it with three n's)
    pub co2e_tonnne_per_hour: f64,

    /// Emissions intensity in grams CO2e per kWh
    pub co2e_grams_per_kwh: f64,

    /// Renewable share as a fraction, only sent by newer API versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_renewable: Option<f64>,
}

impl PowerStationsResponse {
    /// Total generation across all power types
    pub fn total_generation_mw(&self) -> f64 {
        self.power_types.values().map(|p| p.generation_mw).sum()
    }

    /// Total installed capacity across all power types
    pub fn total_capacity_mw(&self) -> f64 {
        self.power_types.values().map(|p| p.capacity_mw).sum()
    }

    pub fn renewable_generation_mw(&self) -> f64 {
        self.power_types
            .iter()
            .filter(|(kind, _)| RENEWABLE_KINDS.contains(&kind.as_str()))
            .map(|(_, p)| p.generation_mw)
            .sum()
    }

    /// Renewable share of generation, preferring the server's figure when present
    pub fn renewable_fraction(&self) -> Option<f64> {
        if let Some(fraction) = self.percent_renewable {
            return Some(fraction);
        }

        let total = self.total_generation_mw();
        (total > 0.0).then(|| self.renewable_generation_mw() / total)
    }

    /// Parses the snapshot timestamp, `None` if it is not a recognised format
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parses RFC 3339 timestamps, falling back to naive timestamps read as UTC
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> PowerStationsResponse {
        let json = r#"{
            "timestamp": "2023-06-28T10:00:00Z",
            "power_types": {
                "hydro": { "generation_mw": 2500.0, "capacity_mw": 5000.0 },
                "gas": { "generation_mw": 500.0, "capacity_mw": 1000.0 },
                "wind": { "generation_mw": 500.0, "capacity_mw": 0.0 }
            },
            "co2e_tonnne_per_hour": 250.5,
            "co2e_grams_per_kwh": 71.6
        }"#;

        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deserialize_without_percent_renewable() {
        let response = snapshot();
        assert_eq!(response.power_types.len(), 3);
        assert_eq!(response.co2e_tonnne_per_hour, 250.5);
        assert_eq!(response.percent_renewable, None);
    }

    #[test]
    fn test_serialize_keeps_wire_names() {
        let value = serde_json::to_value(snapshot()).unwrap();
        assert!(value.get("co2e_tonnne_per_hour").is_some());
        assert!(value.get("percent_renewable").is_none());
    }

    #[test]
    fn test_totals() {
        let response = snapshot();
        assert_eq!(response.total_generation_mw(), 3500.0);
        assert_eq!(response.total_capacity_mw(), 6000.0);
        assert_eq!(response.renewable_generation_mw(), 3000.0);
    }

    #[test]
    fn test_renewable_fraction_computed() {
        let fraction = snapshot().renewable_fraction().unwrap();
        assert!((fraction - 3000.0 / 3500.0).abs() < 1e-9);
    }

    #[test]
    fn test_renewable_fraction_prefers_server_value() {
        let mut response = snapshot();
        response.percent_renewable = Some(0.9);
        assert_eq!(response.renewable_fraction(), Some(0.9));
    }

    #[test]
    fn test_renewable_fraction_without_generation() {
        let mut response = snapshot();
        response.power_types.clear();
        assert_eq!(response.renewable_fraction(), None);
    }

    #[test]
    fn test_utilisation() {
        let response = snapshot();
        assert_eq!(response.power_types["hydro"].utilisation(), Some(0.5));
        assert_eq!(response.power_types["wind"].utilisation(), None);
    }

    #[test]
    fn test_timestamp_parsing() {
        let expected = Utc.with_ymd_and_hms(2023, 6, 28, 10, 0, 0).unwrap();
        assert_eq!(snapshot().timestamp_utc(), Some(expected));
        assert_eq!(parse_timestamp("2023-06-28T10:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2023-06-28T22:00:00+12:00"),
            Some(expected)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
