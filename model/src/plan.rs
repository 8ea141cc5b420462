use crate::records::PlanHopRecord;
use crate::{Leg, LocationCode, Ride, RideID};

/// A route-plan hop mapped onto the legs of a loaded ride, ready for the
/// display layer to slice out and highlight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HopLegRange {
    pub ride: RideID,
    pub start_leg: usize,
    pub end_leg: usize,
}

/// Match each hop from the external path-finding service against the loaded
/// rides. A hop that can't be matched yields None rather than failing the
/// whole plan; the timetable might be out of date, or the train is
/// international with legs outside the feed.
pub fn match_plan_hops(rides: &[Ride], hops: &[PlanHopRecord]) -> Vec<Option<HopLegRange>> {
    hops.iter().map(|hop| match_hop(rides, hop)).collect()
}

fn match_hop(rides: &[Ride], hop: &PlanHopRecord) -> Option<HopLegRange> {
    let Some(ride) = rides.iter().find(|r| r.original_id.as_str() == hop.ride_id) else {
        warn!("ride {} from the route plan isn't loaded", hop.ride_id);
        return None;
    };

    let start_leg = stationary_leg_at(ride, &LocationCode::new(&hop.from))?;
    let end_leg = stationary_leg_at(ride, &LocationCode::new(&hop.to))?;
    if end_leg < start_leg {
        warn!(
            "plan hop {}->{} runs backwards through ride {}",
            hop.from, hop.to, hop.ride_id
        );
        return None;
    }

    Some(HopLegRange {
        ride: ride.id,
        start_leg,
        end_leg,
    })
}

fn stationary_leg_at(ride: &Ride, location: &LocationCode) -> Option<usize> {
    let index = ride.legs.iter().position(
        |leg| matches!(leg, Leg::Stationary { location: at, .. } if at == location),
    );
    if index.is_none() {
        warn!(
            "ride {} never dwells at {}",
            ride.original_id.as_str(),
            location
        );
    }
    index
}
