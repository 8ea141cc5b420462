#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod error;
mod link;
mod passages;
mod path;
mod plan;
pub mod records;
mod ride;
mod time;

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use self::error::ModelError;
pub use self::link::{LegLink, Link, LinkId, Network, Station};
pub use self::passages::{PlatformPassages, StationPassage, StationPassageIndex, StationPassages};
pub use self::path::{Heading, Path, PathPoint, Position2d};
pub use self::plan::{match_plan_hops, HopLegRange};
pub use self::ride::{DwellKind, Leg, PlatformInfo, ResolvedPosition, Ride, Stop, TrackPosition};
pub use self::time::Time;

use self::records::{LinkRecord, RideRecord, StationRecord};

/// Station code as spelled in pair codes and schedules, normalized to
/// lowercase so the feed's mixed casing never matters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationCode(String);

impl LocationCode {
    pub fn new(code: &str) -> LocationCode {
        LocationCode(code.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ride's identifier as the feed spells it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RideName(String);

impl RideName {
    pub fn new(name: String) -> RideName {
        RideName(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cheap index of a ride within one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RideID(pub usize);

/// One immutable snapshot of everything a data refresh produces. Queries
/// against it are pure; publishing a new snapshot is just swapping the whole
/// thing out, so readers mid-tick keep a consistent view.
pub struct Model {
    pub network: Network,
    pub rides: Vec<Ride>,
    pub passages: StationPassageIndex,
}

impl Model {
    /// Build a snapshot from one refresh worth of records. Any construction
    /// error rejects the refresh wholesale; the caller keeps serving the
    /// previous snapshot rather than expose a half-built one.
    pub fn new(
        links: Vec<LinkRecord>,
        stations: Vec<StationRecord>,
        ride_records: Vec<RideRecord>,
    ) -> Result<Self> {
        let network = Network::new(links, stations)?;
        let mut rides = Vec::new();
        for rec in ride_records {
            rides.push(Ride::from_record(RideID(rides.len()), rec, &network)?);
        }
        let passages = StationPassageIndex::new(&rides)?;
        info!(
            "loaded {} links, {} stations, {} rides",
            network.num_links(),
            network.num_stations(),
            rides.len()
        );
        Ok(Self {
            network,
            rides,
            passages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::records::*;
    use super::*;

    fn coord(lat: f64, lon: f64) -> CoordinateRecord {
        CoordinateRecord {
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn a_bad_record_rejects_the_whole_refresh() {
        let links = vec![LinkRecord {
            from: "a".to_string(),
            to: "b".to_string(),
            // A degenerate path: construction must fail, and nothing of the
            // snapshot may survive
            points: vec![coord(0.0, 0.0)],
        }];
        assert!(Model::new(links, Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn builds_a_queryable_snapshot() {
        let links = vec![LinkRecord {
            from: "a".to_string(),
            to: "b".to_string(),
            points: vec![coord(0.0, 0.0), coord(0.0, 1.0)],
        }];
        let stations = vec![
            StationRecord {
                code: "a".to_string(),
                name: "Aldert".to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
            StationRecord {
                code: "b".to_string(),
                name: "Bovenkarspel".to_string(),
                latitude: 0.0,
                longitude: 1.0,
            },
        ];
        let rides = vec![RideRecord {
            id: "123".to_string(),
            legs: vec![
                LegRecord {
                    start_time: 0.0,
                    end_time: 1000.0,
                    moving: false,
                    from: None,
                    to: None,
                    waypoints: Vec::new(),
                    location: Some("a".to_string()),
                    dwell_kind: DwellKind::Departure,
                    platform: Some(PlatformRecord {
                        arrival_platform: "1".to_string(),
                        departure_platform: "1".to_string(),
                    }),
                },
                LegRecord {
                    start_time: 1000.0,
                    end_time: 2000.0,
                    moving: true,
                    from: Some("a".to_string()),
                    to: Some("b".to_string()),
                    waypoints: Vec::new(),
                    location: None,
                    dwell_kind: DwellKind::Unknown,
                    platform: None,
                },
                LegRecord {
                    start_time: 2000.0,
                    end_time: 3000.0,
                    moving: false,
                    from: None,
                    to: None,
                    waypoints: Vec::new(),
                    location: Some("b".to_string()),
                    dwell_kind: DwellKind::Arrival,
                    platform: Some(PlatformRecord {
                        arrival_platform: "2".to_string(),
                        departure_platform: "2".to_string(),
                    }),
                },
            ],
        }];

        let model = Model::new(links, stations, rides).unwrap();
        assert_eq!(model.rides.len(), 1);
        assert_eq!(model.rides[0].stops.len(), 2);
        assert!(model.passages.lookup(&LocationCode::new("a")).is_some());

        // And it answers the per-tick query
        let pos = model.rides[0]
            .position_at(&model.network, Time::from_millis(1500.0))
            .unwrap();
        assert!(pos.position.x() > 0.0 && pos.position.x() < 1.0);
    }
}
