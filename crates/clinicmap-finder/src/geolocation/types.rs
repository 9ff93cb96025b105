use std::future::Future;
use std::time::Duration;

use clinicmap_core::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Options passed to a [`LocationProvider`] for a live position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest device-cached fix the provider may return.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

/// A position fix as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: LatLng,
    /// Accuracy radius in metres.
    pub accuracy: f64,
}

/// The user's last known location, as cached in the session store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    /// Epoch milliseconds at which the fix was taken.
    pub timestamp: i64,
}

impl UserLocation {
    #[must_use]
    pub fn from_position(position: Position, timestamp: i64) -> Self {
        Self {
            latitude: position.coords.lat,
            longitude: position.coords.lng,
            accuracy: position.accuracy,
            timestamp,
        }
    }

    #[must_use]
    pub fn coords(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Why a location request failed. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Location access was denied. Enable location permissions to see nearby clinics.")]
    PermissionDenied,

    #[error("Your location could not be determined.")]
    PositionUnavailable,

    #[error("Timed out while getting your location. Please try again.")]
    Timeout,

    #[error("Location services are not supported on this device.")]
    Unsupported,

    #[error("An unknown error occurred while getting your location: {0}")]
    Unknown(String),
}

/// Geolocation permission as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Prompt,
    Unknown,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::Prompt => write!(f, "prompt"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Source of live position fixes.
pub trait LocationProvider: Send + Sync {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Position, PositionError>> + Send;
}

/// Optional permissions capability. Platforms without one return `None`
/// from [`PermissionProvider::query`].
pub trait PermissionProvider: Send + Sync {
    fn query(&self) -> Option<PermissionState>;

    /// Change notifications, when the platform offers them.
    fn subscribe(&self) -> Option<watch::Receiver<PermissionState>> {
        None
    }
}

impl<P> PermissionProvider for std::sync::Arc<P>
where
    P: PermissionProvider + ?Sized,
{
    fn query(&self) -> Option<PermissionState> {
        (**self).query()
    }

    fn subscribe(&self) -> Option<watch::Receiver<PermissionState>> {
        (**self).subscribe()
    }
}

/// Always answers with the same fix (or the same failure).
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    result: Result<Position, PositionError>,
}

impl FixedLocationProvider {
    #[must_use]
    pub fn new(coords: LatLng, accuracy: f64) -> Self {
        Self {
            result: Ok(Position { coords, accuracy }),
        }
    }

    #[must_use]
    pub fn failing(error: PositionError) -> Self {
        Self { result: Err(error) }
    }

    /// A provider for devices with no location capability.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::failing(PositionError::Unsupported)
    }
}

impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, PositionError> {
        self.result.clone()
    }
}

/// Permission state held in memory; [`StaticPermissions::set`] notifies
/// subscribers.
#[derive(Debug)]
pub struct StaticPermissions {
    state: watch::Sender<PermissionState>,
}

impl StaticPermissions {
    #[must_use]
    pub fn new(state: PermissionState) -> Self {
        let (state, _) = watch::channel(state);
        Self { state }
    }

    pub fn set(&self, state: PermissionState) {
        self.state.send_replace(state);
    }
}

impl PermissionProvider for StaticPermissions {
    fn query(&self) -> Option<PermissionState> {
        Some(*self.state.borrow())
    }

    fn subscribe(&self) -> Option<watch::Receiver<PermissionState>> {
        Some(self.state.subscribe())
    }
}
