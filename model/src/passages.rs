use std::collections::BTreeMap;

use crate::{LocationCode, ModelError, Ride, RideID, Time};

/// One scheduled visit of a vehicle to a station.
#[derive(Clone, Debug, PartialEq)]
pub struct StationPassage {
    pub start_time: Time,
    pub end_time: Time,
    pub ride: RideID,
}

#[derive(Clone, Debug)]
pub struct PlatformPassages {
    pub platform: String,
    /// Ordered by start_time
    pub passages: Vec<StationPassage>,
}

#[derive(Clone, Debug)]
pub struct StationPassages {
    pub location: LocationCode,
    /// Ordered by platform number, then suffix ("1", "2", "9a", "9b", "10")
    pub platforms: Vec<PlatformPassages>,
}

/// Per-station timetable, aggregated once from every ride's stops when a data
/// refresh lands. Read-only afterwards; the next refresh builds a new one.
#[derive(Debug)]
pub struct StationPassageIndex {
    stations: BTreeMap<LocationCode, StationPassages>,
}

impl StationPassageIndex {
    pub fn new(rides: &[Ride]) -> Result<Self, ModelError> {
        let mut raw: BTreeMap<LocationCode, BTreeMap<String, Vec<StationPassage>>> =
            BTreeMap::new();
        for ride in rides {
            for stop in &ride.stops {
                let buckets = raw.entry(stop.location.clone()).or_default();
                // A stop without platform info still registers the station,
                // it just can't land in any platform timeline
                let Some(platform) = &stop.platform else {
                    continue;
                };
                buckets
                    .entry(platform.arrival.clone())
                    .or_default()
                    .push(StationPassage {
                        start_time: stop.arrival_time,
                        end_time: stop.departure_time,
                        ride: ride.id,
                    });
            }
        }

        let mut stations = BTreeMap::new();
        for (location, buckets) in raw {
            let mut platforms = Vec::new();
            for (label, mut passages) in buckets {
                passages.sort_by(|a, b| {
                    a.start_time.as_millis().total_cmp(&b.start_time.as_millis())
                });
                platforms.push((
                    platform_sort_key(&label)?,
                    PlatformPassages {
                        platform: label,
                        passages,
                    },
                ));
            }
            platforms.sort_by(|a, b| a.0.cmp(&b.0));
            stations.insert(
                location.clone(),
                StationPassages {
                    location,
                    platforms: platforms.into_iter().map(|(_, p)| p).collect(),
                },
            );
        }
        Ok(Self { stations })
    }

    /// A station nobody stops at just isn't in here; that's not an error.
    pub fn lookup(&self, location: &LocationCode) -> Option<&StationPassages> {
        self.stations.get(location)
    }

    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }
}

/// Platforms sort by their leading number, breaking ties on the last
/// character, so "4" < "4a" < "4b" < "10". A label without a leading number
/// is bad feed data, not something to sort arbitrarily.
fn platform_sort_key(label: &str) -> Result<(u64, u32), ModelError> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ModelError::NoDigitsInPlatformLabel {
            label: label.to_string(),
        });
    }
    // A run too long for u64 still has digits; it just sorts at the top
    let number = digits.parse().unwrap_or(u64::MAX);
    let suffix = label.chars().last().map(u32::from).unwrap_or(0);
    Ok((number, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ride::{DwellKind, PlatformInfo, Stop};
    use crate::RideName;

    fn stop(location: &str, arrival: f64, departure: f64, platform: Option<&str>) -> Stop {
        Stop {
            location: LocationCode::new(location),
            arrival_time: Time::from_millis(arrival),
            departure_time: Time::from_millis(departure),
            dwell_kind: DwellKind::Short,
            platform: platform.map(|p| PlatformInfo {
                arrival: p.to_string(),
                departure: p.to_string(),
            }),
        }
    }

    fn ride_with_stops(id: usize, stops: Vec<Stop>) -> Ride {
        let start_time = stops
            .first()
            .map(|s| s.arrival_time)
            .unwrap_or(Time::from_millis(0.0));
        let end_time = stops
            .last()
            .map(|s| s.departure_time)
            .unwrap_or(Time::from_millis(0.0));
        Ride {
            id: RideID(id),
            original_id: RideName::new(id.to_string()),
            legs: Vec::new(),
            stops,
            start_time,
            end_time,
        }
    }

    #[test]
    fn platform_ordering_is_numeric_then_suffix() {
        let rides: Vec<Ride> = ["10", "2", "9a", "9b", "1"]
            .iter()
            .enumerate()
            .map(|(i, platform)| {
                ride_with_stops(i, vec![stop("ut", 100.0, 200.0, Some(platform))])
            })
            .collect();

        let index = StationPassageIndex::new(&rides).unwrap();
        let station = index.lookup(&LocationCode::new("ut")).unwrap();
        let order: Vec<&str> = station
            .platforms
            .iter()
            .map(|p| p.platform.as_str())
            .collect();
        assert_eq!(order, vec!["1", "2", "9a", "9b", "10"]);
    }

    #[test]
    fn passages_are_sorted_by_start_time() {
        let rides = vec![
            ride_with_stops(0, vec![stop("ut", 100.0, 150.0, Some("5"))]),
            ride_with_stops(1, vec![stop("ut", 50.0, 80.0, Some("5"))]),
        ];

        let index = StationPassageIndex::new(&rides).unwrap();
        let station = index.lookup(&LocationCode::new("ut")).unwrap();
        assert_eq!(station.platforms.len(), 1);
        let times: Vec<f64> = station.platforms[0]
            .passages
            .iter()
            .map(|p| p.start_time.as_millis())
            .collect();
        assert_eq!(times, vec![50.0, 100.0]);
        assert_eq!(station.platforms[0].passages[0].ride, RideID(1));
    }

    #[test]
    fn stop_without_platform_only_registers_the_station() {
        let rides = vec![ride_with_stops(0, vec![stop("asd", 100.0, 200.0, None)])];
        let index = StationPassageIndex::new(&rides).unwrap();
        let station = index.lookup(&LocationCode::new("asd")).unwrap();
        assert!(station.platforms.is_empty());
    }

    #[test]
    fn digitless_platform_label_poisons_the_build() {
        let rides = vec![ride_with_stops(0, vec![stop("ut", 0.0, 1.0, Some("x"))])];
        assert_eq!(
            StationPassageIndex::new(&rides).unwrap_err(),
            ModelError::NoDigitsInPlatformLabel {
                label: "x".to_string()
            }
        );
        // Digits that don't lead the label don't count either
        let rides = vec![ride_with_stops(0, vec![stop("ut", 0.0, 1.0, Some("a4"))])];
        assert!(StationPassageIndex::new(&rides).is_err());
    }

    #[test]
    fn oversized_digit_runs_sort_last_instead_of_erroring() {
        let huge = "99999999999999999999999999";
        let rides = vec![
            ride_with_stops(0, vec![stop("ut", 0.0, 1.0, Some(huge))]),
            ride_with_stops(1, vec![stop("ut", 0.0, 1.0, Some("3"))]),
        ];
        let index = StationPassageIndex::new(&rides).unwrap();
        let station = index.lookup(&LocationCode::new("ut")).unwrap();
        let order: Vec<&str> = station
            .platforms
            .iter()
            .map(|p| p.platform.as_str())
            .collect();
        assert_eq!(order, vec!["3", huge]);
    }

    #[test]
    fn lookup_miss_is_not_an_error() {
        let index = StationPassageIndex::new(&[]).unwrap();
        assert!(index.lookup(&LocationCode::new("ut")).is_none());
        assert_eq!(index.num_stations(), 0);
    }
}
