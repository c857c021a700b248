// Location acquisition
// Public interface for resolving the requester's current position

mod resolver;

pub use resolver::{
    LocationResolver, PositionCallback, PositionOptions, PositionSource, RawPosition,
};

use serde::Serialize;
use thiserror::Error;

/// A validated geographic coordinate pair.
///
/// Out-of-range values are rejected at construction, never clamped, so
/// downstream code can trust the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build a coordinate pair, rejecting values outside [-90, 90] latitude
    /// or [-180, 180] longitude.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Debug, Clone, Copy, Error)]
#[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Error code reported by the platform position capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

/// Why a location could not be acquired.
///
/// Single attempt, no retry; the orchestrator decides what to do next.
/// Messages are user-presentable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Please enable location permissions to use this feature.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("Location request timed out.")]
    Timeout,

    #[error("Geolocation is not supported on this platform.")]
    Unsupported,
}

impl From<PositionErrorCode> for GeolocationError {
    fn from(code: PositionErrorCode) -> Self {
        match code {
            PositionErrorCode::PermissionDenied => GeolocationError::PermissionDenied,
            PositionErrorCode::PositionUnavailable => GeolocationError::PositionUnavailable,
            PositionErrorCode::Timeout => GeolocationError::Timeout,
        }
    }
}
