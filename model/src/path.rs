use geo::{Distance, Haversine, Point};

use crate::ModelError;

/// Offsets within this of a path's ends are float noise, not caller bugs.
/// 1e-6 km is a millimeter.
const OFFSET_EPSILON: f64 = 1e-6;

/// A point along a `Path`, `start_offset` kilometers of track from the first
/// point.
#[derive(Clone, Debug)]
pub struct PathPoint {
    pub position: Point<f64>,
    pub start_offset: f64,
}

/// An ordered polyline with cumulative great-circle distance per point, built
/// once from raw coordinates and never mutated.
#[derive(Clone, Debug)]
pub struct Path {
    points: Vec<PathPoint>,
    length: f64,
}

impl Path {
    pub fn new(coordinates: Vec<Point<f64>>) -> Result<Self, ModelError> {
        if coordinates.len() < 2 {
            return Err(ModelError::InvalidPath {
                points: coordinates.len(),
            });
        }

        let mut points = vec![PathPoint {
            position: coordinates[0],
            start_offset: 0.0,
        }];
        let mut sum = 0.0;
        for pair in coordinates.windows(2) {
            // Coincident points are allowed and just contribute nothing
            sum += Haversine.distance(pair[0], pair[1]) / 1000.0;
            points.push(PathPoint {
                position: pair[1],
                start_offset: sum,
            });
        }

        Ok(Self {
            points,
            length: sum,
        })
    }

    /// Total length in kilometers.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// The pair of points bracketing `offset`, inclusive on both ends. The
    /// caller is responsible for clamping; anything more than a hair outside
    /// `[0, length]` is an error, not silently pulled back in.
    pub fn find_offset_span(&self, offset: f64) -> Result<(&PathPoint, &PathPoint), ModelError> {
        let idx = self.span_index(offset)?;
        Ok((&self.points[idx], &self.points[idx + 1]))
    }

    /// Where the vehicle is at `offset` kilometers along the path, and which
    /// way it's facing (in point-storage order).
    pub fn interpolate(&self, offset: f64) -> Result<Position2d, ModelError> {
        let idx = self.span_index(offset)?;
        let low = &self.points[idx];
        let high = &self.points[idx + 1];

        let span = high.start_offset - low.start_offset;
        let fraction = if span > 0.0 {
            (offset - low.start_offset) / span
        } else {
            0.0
        };
        let longitude = lerp(low.position.x(), high.position.x(), fraction);
        let latitude = lerp(low.position.y(), high.position.y(), fraction);

        let heading = match Heading::between(low.position, high.position) {
            Some(heading) => heading,
            // Zero-length span. Face the way the nearest real span does.
            None => self.heading_near(idx),
        };

        Ok(Position2d {
            position: Point::new(longitude, latitude),
            heading,
        })
    }

    fn span_index(&self, offset: f64) -> Result<usize, ModelError> {
        let offset = if offset < 0.0 && offset >= -OFFSET_EPSILON {
            0.0
        } else if offset > self.length && offset <= self.length + OFFSET_EPSILON {
            self.length
        } else {
            offset
        };

        for idx in 0..self.points.len() - 1 {
            // Inclusive on both ends
            if offset >= self.points[idx].start_offset && offset <= self.points[idx + 1].start_offset
            {
                return Ok(idx);
            }
        }
        Err(ModelError::OffsetOutOfRange {
            offset,
            length: self.length,
        })
    }

    /// The direction of the non-degenerate span closest to `idx`, alternating
    /// outwards (forwards winning ties), or zero if every span is degenerate.
    fn heading_near(&self, idx: usize) -> Heading {
        let num_spans = self.points.len() - 1;
        for step in 1..num_spans {
            if idx + step < num_spans {
                if let Some(heading) = self.span_heading(idx + step) {
                    return heading;
                }
            }
            if let Some(i) = idx.checked_sub(step) {
                if let Some(heading) = self.span_heading(i) {
                    return heading;
                }
            }
        }
        Heading::ZERO
    }

    fn span_heading(&self, idx: usize) -> Option<Heading> {
        Heading::between(self.points[idx].position, self.points[idx + 1].position)
    }
}

fn lerp(low: f64, high: f64, fraction: f64) -> f64 {
    low + (high - low) * fraction
}

/// A resolved geographic position plus travel direction.
#[derive(Clone, Copy, Debug)]
pub struct Position2d {
    pub position: Point<f64>,
    pub heading: Heading,
}

/// Unit direction-of-travel vector in the lon/lat plane, or zero when the
/// vehicle is parked and has no meaningful direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heading {
    pub east: f64,
    pub north: f64,
}

impl Heading {
    pub const ZERO: Heading = Heading {
        east: 0.0,
        north: 0.0,
    };

    /// None if the two points coincide.
    pub fn between(from: Point<f64>, to: Point<f64>) -> Option<Heading> {
        let east = to.x() - from.x();
        let north = to.y() - from.y();
        let len = east.hypot(north);
        if len == 0.0 {
            return None;
        }
        Some(Heading {
            east: east / len,
            north: north / len,
        })
    }

    pub fn reversed(self) -> Heading {
        Heading {
            east: -self.east,
            north: -self.north,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Heading::ZERO
    }
}
