use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::records::{PlatformRecord, RideRecord};
use crate::{
    Heading, LegLink, LocationCode, ModelError, Network, Position2d, RideID, RideName, Time,
};

/// Elapsed-time fractions this far outside [0, 1] are float noise at leg
/// boundaries; anything worse means the leg times are inconsistent.
const FRACTION_EPSILON: f64 = 1e-6;

/// Why the vehicle is standing still at a stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DwellKind {
    #[default]
    Unknown,
    /// Passes through without actually stopping
    Waypoint,
    Short,
    Long,
    Departure,
    Arrival,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformInfo {
    pub arrival: String,
    pub departure: String,
}

impl PlatformInfo {
    /// "4", or "4->5" when the train switches platforms while dwelling.
    pub fn display(&self) -> String {
        if self.arrival == self.departure {
            self.arrival.clone()
        } else {
            format!("{}->{}", self.arrival, self.departure)
        }
    }
}

impl From<PlatformRecord> for PlatformInfo {
    fn from(rec: PlatformRecord) -> Self {
        Self {
            arrival: rec.arrival_platform,
            departure: rec.departure_platform,
        }
    }
}

/// One phase of a ride: dwelling at a station, or moving over one or more
/// directed links.
pub enum Leg {
    Stationary {
        start_time: Time,
        end_time: Time,
        location: LocationCode,
        /// The station's coordinate, resolved at construction so queries
        /// never have to look it up (or fail to).
        position: geo::Point<f64>,
        dwell_kind: DwellKind,
        platform: Option<PlatformInfo>,
    },
    Moving {
        start_time: Time,
        end_time: Time,
        from: LocationCode,
        to: LocationCode,
        links: Vec<LegLink>,
        /// Sum of the link lengths, in kilometers
        total_distance: f64,
    },
}

impl Leg {
    pub fn start_time(&self) -> Time {
        match self {
            Leg::Stationary { start_time, .. } | Leg::Moving { start_time, .. } => *start_time,
        }
    }

    pub fn end_time(&self) -> Time {
        match self {
            Leg::Stationary { end_time, .. } | Leg::Moving { end_time, .. } => *end_time,
        }
    }
}

/// A dwell as the user sees it, projected from a stationary leg once at ride
/// construction.
#[derive(Clone, Debug)]
pub struct Stop {
    pub location: LocationCode,
    pub arrival_time: Time,
    pub departure_time: Time,
    pub dwell_kind: DwellKind,
    pub platform: Option<PlatformInfo>,
}

/// A vehicle's full itinerary for one scheduled run.
pub struct Ride {
    pub id: RideID,
    pub original_id: RideName,
    pub legs: Vec<Leg>,
    pub stops: Vec<Stop>,
    pub start_time: Time,
    pub end_time: Time,
}

impl Ride {
    pub fn from_record(id: RideID, rec: RideRecord, network: &Network) -> Result<Ride> {
        if rec.legs.is_empty() {
            bail!("ride {} has no legs", rec.id);
        }

        let mut legs = Vec::new();
        for leg in &rec.legs {
            let start_time = Time::from_millis(leg.start_time);
            let end_time = Time::from_millis(leg.end_time);
            if end_time < start_time {
                bail!(
                    "ride {} has a leg ending ({}) before it starts ({})",
                    rec.id,
                    end_time,
                    start_time
                );
            }

            if leg.moving {
                let (Some(from), Some(to)) = (&leg.from, &leg.to) else {
                    bail!("moving leg of ride {} is missing from/to", rec.id);
                };

                let mut codes = vec![from.clone()];
                codes.extend(leg.waypoints.iter().cloned());
                codes.push(to.clone());

                let mut links = Vec::new();
                let mut total_distance = 0.0;
                for pair in codes.windows(2) {
                    let leg_link =
                        network.leg_link_from_code(&format!("{}_{}", pair[0], pair[1]))?;
                    total_distance += leg_link.length(network);
                    links.push(leg_link);
                }

                legs.push(Leg::Moving {
                    start_time,
                    end_time,
                    from: LocationCode::new(from),
                    to: LocationCode::new(to),
                    links,
                    total_distance,
                });
            } else {
                let Some(location) = &leg.location else {
                    bail!("stationary leg of ride {} is missing its location", rec.id);
                };
                let location = LocationCode::new(location);
                let Some(station) = network.station(&location) else {
                    bail!("ride {} dwells at unknown station {}", rec.id, location);
                };
                legs.push(Leg::Stationary {
                    start_time,
                    end_time,
                    location,
                    position: station.position,
                    dwell_kind: leg.dwell_kind,
                    platform: leg.platform.clone().map(PlatformInfo::from),
                });
            }
        }

        for pair in legs.windows(2) {
            if pair[1].start_time() != pair[0].end_time() {
                bail!(
                    "legs of ride {} aren't contiguous: {} then {}",
                    rec.id,
                    pair[0].end_time(),
                    pair[1].start_time()
                );
            }
        }

        let stops = legs
            .iter()
            .filter_map(|leg| match leg {
                Leg::Stationary {
                    start_time,
                    end_time,
                    location,
                    dwell_kind,
                    platform,
                    ..
                } => Some(Stop {
                    location: location.clone(),
                    arrival_time: *start_time,
                    departure_time: *end_time,
                    dwell_kind: *dwell_kind,
                    platform: platform.clone(),
                }),
                Leg::Moving { .. } => None,
            })
            .collect();

        let start_time = legs[0].start_time();
        let end_time = legs[legs.len() - 1].end_time();
        Ok(Ride {
            id,
            original_id: RideName::new(rec.id),
            legs,
            stops,
            start_time,
            end_time,
        })
    }

    /// Cheap pre-filter; callers skip inactive rides instead of eating a
    /// TimeOutOfRange per tick. The span is half-open, so a ride is already
    /// inactive at exactly its end time.
    pub fn is_active(&self, time: Time) -> bool {
        time >= self.start_time && time < self.end_time
    }

    pub fn active_leg_index(&self, time: Time) -> Result<usize, ModelError> {
        let out_of_range = ModelError::TimeOutOfRange {
            time: time.as_millis(),
            start: self.start_time.as_millis(),
            end: self.end_time.as_millis(),
        };
        if !self.is_active(time) {
            return Err(out_of_range);
        }
        self.legs
            .iter()
            .position(|leg| time >= leg.start_time() && time < leg.end_time())
            .ok_or(out_of_range)
    }

    /// Where the vehicle is at `time`: parked at a station, or somewhere
    /// along a link. Stateless; every query stands alone.
    pub fn resolve(&self, network: &Network, time: Time) -> Result<ResolvedPosition, ModelError> {
        match &self.legs[self.active_leg_index(time)?] {
            Leg::Stationary { position, .. } => Ok(ResolvedPosition::AtStation(Position2d {
                position: *position,
                heading: Heading::ZERO,
            })),
            Leg::Moving {
                start_time,
                end_time,
                links,
                total_distance,
                ..
            } => {
                let fraction = (time - *start_time) / (*end_time - *start_time);
                // The range check also rejects NaN from zero-duration legs
                if !(-FRACTION_EPSILON..=1.0 + FRACTION_EPSILON).contains(&fraction) {
                    return Err(ModelError::FractionOutOfRange { fraction });
                }
                let target = fraction.clamp(0.0, 1.0) * total_distance;

                let mut running = 0.0;
                for leg_link in links {
                    let length = leg_link.length(network);
                    if target <= running + length {
                        return Ok(ResolvedPosition::OnLink(TrackPosition {
                            leg_link: *leg_link,
                            offset: target - running,
                        }));
                    }
                    running += length;
                }
                // total_distance disagrees with the links it was summed from
                Err(ModelError::SegmentNotFoundForDistance { distance: target })
            }
        }
    }

    /// The per-tick query: resolve and realize in one go.
    pub fn position_at(&self, network: &Network, time: Time) -> Result<Position2d, ModelError> {
        match self.resolve(network, time)? {
            ResolvedPosition::AtStation(position) => Ok(position),
            ResolvedPosition::OnLink(track_position) => track_position.realize(network),
        }
    }
}

/// A position expressed as "this far along this directed link", before being
/// turned into geography. The offset is kilometers from the departure end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPosition {
    pub leg_link: LegLink,
    pub offset: f64,
}

impl TrackPosition {
    pub fn realize(&self, network: &Network) -> Result<Position2d, ModelError> {
        let native_offset = self.leg_link.normalize_offset(network, self.offset);
        let mut resolved = network.link(self.leg_link.link).path.interpolate(native_offset)?;
        // Interpolation faces storage order; flip to travel order
        if self.leg_link.reversed {
            resolved.heading = resolved.heading.reversed();
        }
        Ok(resolved)
    }
}

pub enum ResolvedPosition {
    AtStation(Position2d),
    OnLink(TrackPosition),
}
