//! The shapes the external fetch layer hands over, already deserialized from
//! whatever wire format it owns.

use serde::Deserialize;

use crate::ride::DwellKind;

#[derive(Clone, Debug, Deserialize)]
pub struct CoordinateRecord {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LinkRecord {
    pub from: String,
    pub to: String,
    pub points: Vec<CoordinateRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StationRecord {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlatformRecord {
    pub arrival_platform: String,
    pub departure_platform: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RideRecord {
    pub id: String,
    pub legs: Vec<LegRecord>,
}

/// One phase of a schedule. Which optional fields apply depends on `moving`;
/// `Ride::from_record` checks and turns this into the proper sum type.
#[derive(Clone, Debug, Deserialize)]
pub struct LegRecord {
    /// Milliseconds since midnight of the service day
    pub start_time: f64,
    pub end_time: f64,
    pub moving: bool,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub waypoints: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub dwell_kind: DwellKind,
    #[serde(default)]
    pub platform: Option<PlatformRecord>,
}

/// One hop of a route-plan result from the external path-finding service.
#[derive(Clone, Debug, Deserialize)]
pub struct PlanHopRecord {
    pub from: String,
    pub to: String,
    pub ride_id: String,
}
