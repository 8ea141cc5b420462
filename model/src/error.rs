use thiserror::Error;

/// Everything that can go wrong while building or querying a snapshot.
///
/// The first three variants only happen during construction and poison the
/// whole refresh; the rest are per-query and leave shared state untouched.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("path needs at least 2 coordinates, got {points}")]
    InvalidPath { points: usize },
    #[error("no link registered for pair code {code:?}")]
    SegmentNotFound { code: String },
    #[error("platform label {label:?} doesn't start with a digit")]
    NoDigitsInPlatformLabel { label: String },
    #[error("time {time}ms outside ride span [{start}ms, {end}ms)")]
    TimeOutOfRange { time: f64, start: f64, end: f64 },
    #[error("offset {offset}km outside path of length {length}km")]
    OffsetOutOfRange { offset: f64, length: f64 },
    #[error("elapsed fraction {fraction} materially outside [0, 1]")]
    FractionOutOfRange { fraction: f64 },
    #[error("distance {distance}km not covered by any link of the leg")]
    SegmentNotFoundForDistance { distance: f64 },
}
