use std::collections::BTreeMap;

use anyhow::Result;
use geo::Point;

use crate::records::{LinkRecord, StationRecord};
use crate::{LocationCode, ModelError, Path, PathPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LinkId(pub usize);

/// An undirected stretch of track between two stations. `from`/`to` is just
/// how the feed happened to author it, not a travel direction.
pub struct Link {
    pub from: LocationCode,
    pub to: LocationCode,
    pub path: Path,
}

pub struct Station {
    pub code: LocationCode,
    pub name: String,
    pub position: Point<f64>,
}

/// The immutable registry of links and stations one data refresh produces.
/// Links are stored once and looked up by pair code in either orientation.
pub struct Network {
    links: Vec<Link>,
    codes: BTreeMap<String, LinkId>,
    stations: BTreeMap<LocationCode, Station>,
}

impl Network {
    pub fn new(links: Vec<LinkRecord>, stations: Vec<StationRecord>) -> Result<Self> {
        let mut network = Network {
            links: Vec::new(),
            codes: BTreeMap::new(),
            stations: BTreeMap::new(),
        };

        for rec in links {
            let from = LocationCode::new(&rec.from);
            let to = LocationCode::new(&rec.to);
            let path = Path::new(
                rec.points
                    .iter()
                    .map(|c| Point::new(c.longitude, c.latitude))
                    .collect(),
            )?;
            let id = LinkId(network.links.len());
            // Register both orientations; a LegLink recovers the direction
            // from the code it was built with.
            network.codes.insert(pair_code(&from, &to), id);
            network.codes.insert(pair_code(&to, &from), id);
            network.links.push(Link { from, to, path });
        }

        for rec in stations {
            let code = LocationCode::new(&rec.code);
            network.stations.insert(
                code.clone(),
                Station {
                    code,
                    name: rec.name,
                    position: Point::new(rec.longitude, rec.latitude),
                },
            );
        }

        Ok(network)
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn station(&self, code: &LocationCode) -> Option<&Station> {
        self.stations.get(code)
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    /// Resolve a pair code like "asd_ut" into a link walked in the direction
    /// the code spells out.
    pub fn leg_link_from_code(&self, code: &str) -> Result<LegLink, ModelError> {
        let code = code.to_lowercase();
        let id = *self
            .codes
            .get(&code)
            .ok_or_else(|| ModelError::SegmentNotFound { code: code.clone() })?;
        let left = code.split('_').next().unwrap_or_default();
        Ok(LegLink {
            link: id,
            reversed: left != self.links[id.0].from.as_str(),
        })
    }
}

pub fn pair_code(from: &LocationCode, to: &LocationCode) -> String {
    format!("{}_{}", from.as_str(), to.as_str())
}

/// A link walked in a specific direction. Just an index into the registry
/// plus a flag; the path data is never copied per ride.
///
/// All reversal arithmetic lives here. Higher layers ask for
/// direction-normalized offsets and iteration instead of re-deriving it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegLink {
    pub link: LinkId,
    pub reversed: bool,
}

impl LegLink {
    /// The departure station of this traversal.
    pub fn first_location<'a>(&self, network: &'a Network) -> &'a LocationCode {
        let link = network.link(self.link);
        if self.reversed {
            &link.to
        } else {
            &link.from
        }
    }

    /// The arrival station of this traversal.
    pub fn last_location<'a>(&self, network: &'a Network) -> &'a LocationCode {
        let link = network.link(self.link);
        if self.reversed {
            &link.from
        } else {
            &link.to
        }
    }

    pub fn length(&self, network: &Network) -> f64 {
        network.link(self.link).path.length()
    }

    /// Convert between an offset in the path's storage orientation and one
    /// measured from the departure end. The mapping is its own inverse.
    pub fn normalize_offset(&self, network: &Network, native_offset: f64) -> f64 {
        if self.reversed {
            network.link(self.link).path.length() - native_offset
        } else {
            native_offset
        }
    }

    /// Walk the path's points in travel order, yielding each point with its
    /// distance from the departure end.
    pub fn iter_with_distance<F: FnMut(&PathPoint, f64)>(&self, network: &Network, mut visit: F) {
        let path = &network.link(self.link).path;
        if self.reversed {
            for point in path.points().iter().rev() {
                visit(point, path.length() - point.start_offset);
            }
        } else {
            for point in path.points() {
                visit(point, point.start_offset);
            }
        }
    }
}
