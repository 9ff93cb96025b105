//! Current-location tracking with a short-lived session cache.
//!
//! [`GeolocationProvider`] combines three capabilities: a [`LocationProvider`]
//! for live fixes, an optional [`PermissionProvider`] and a [`SessionStore`]
//! that caches the last fix under [`SESSION_KEY`].

mod session;
mod types;

use std::time::Duration;

use clinicmap_core::{haversine_km, Clinic, LatLng};
use tokio::sync::watch;

pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreError};
pub use types::{
    FixedLocationProvider, LocationProvider, PermissionProvider, PermissionState, Position,
    PositionError, PositionOptions, StaticPermissions, UserLocation,
};

/// Session store key holding the JSON-encoded [`UserLocation`].
pub const SESSION_KEY: &str = "userLocation";

/// How long a cached fix is reused before a live request is made.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct GeolocationProvider<L, S> {
    locator: L,
    store: S,
    permissions: Option<Box<dyn PermissionProvider>>,
    permission_rx: Option<watch::Receiver<PermissionState>>,
    options: PositionOptions,
    cache_ttl: Duration,
    user_location: Option<UserLocation>,
    location_error: Option<PositionError>,
    location_loading: bool,
    permission_status: PermissionState,
}

impl<L, S> GeolocationProvider<L, S>
where
    L: LocationProvider,
    S: SessionStore,
{
    #[must_use]
    pub fn new(locator: L, store: S) -> Self {
        Self {
            locator,
            store,
            permissions: None,
            permission_rx: None,
            options: PositionOptions::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            user_location: None,
            location_error: None,
            location_loading: false,
            permission_status: PermissionState::default(),
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: impl PermissionProvider + 'static) -> Self {
        self.permissions = Some(Box::new(permissions));
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// Reads the current permission state and subscribes to changes.
    /// Requests a location straight away when permission is already granted.
    pub async fn mount(&mut self) {
        if let Some(permissions) = &self.permissions {
            if let Some(state) = permissions.query() {
                self.permission_status = state;
            }
            self.permission_rx = permissions.subscribe();
        }
        tracing::debug!(permission = %self.permission_status, "geolocation mounted");

        if self.permission_status == PermissionState::Granted {
            self.request_location().await;
        }
    }

    /// Resolves the user's location, preferring a fresh session-cached fix.
    ///
    /// Failures are recorded in [`Self::location_error`]; the previous
    /// location, if any, is kept.
    pub async fn request_location(&mut self) -> Option<UserLocation> {
        self.location_loading = true;
        self.location_error = None;

        if let Some(cached) = self.cached_location() {
            tracing::debug!(timestamp = cached.timestamp, "using session-cached location");
            self.user_location = Some(cached);
            self.location_loading = false;
            return self.user_location;
        }

        let live = match tokio::time::timeout(
            self.options.timeout,
            self.locator.current_position(&self.options),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(PositionError::Timeout),
        };

        match live {
            Ok(position) => {
                let location = UserLocation::from_position(position, now_millis());
                self.store_location(&location);
                tracing::info!(
                    lat = location.latitude,
                    lng = location.longitude,
                    accuracy = location.accuracy,
                    "user location resolved"
                );
                self.user_location = Some(location);
                self.permission_status = PermissionState::Granted;
            }
            Err(err) => {
                tracing::warn!(error = %err, "location request failed");
                if err == PositionError::PermissionDenied {
                    self.permission_status = PermissionState::Denied;
                }
                self.location_error = Some(err);
            }
        }
        self.location_loading = false;
        self.user_location
    }

    /// Forgets the location in memory and in the session store.
    pub fn clear_location(&mut self) {
        self.user_location = None;
        self.location_error = None;
        if let Err(e) = self.store.remove(SESSION_KEY) {
            tracing::warn!(error = %e, "failed to clear cached location");
        }
    }

    /// Waits for the next permission change and applies it. Revocation
    /// clears the location.
    ///
    /// Returns `None` when there is no subscription or the source is gone.
    pub async fn next_permission_change(&mut self) -> Option<PermissionState> {
        let rx = self.permission_rx.as_mut()?;
        if rx.changed().await.is_err() {
            self.permission_rx = None;
            return None;
        }
        let state = *rx.borrow_and_update();
        tracing::debug!(permission = %state, "geolocation permission changed");

        self.permission_status = state;
        if state == PermissionState::Denied {
            self.clear_location();
        }
        Some(state)
    }

    #[must_use]
    pub fn user_location(&self) -> Option<UserLocation> {
        self.user_location
    }

    #[must_use]
    pub fn location_error(&self) -> Option<&PositionError> {
        self.location_error.as_ref()
    }

    #[must_use]
    pub fn location_loading(&self) -> bool {
        self.location_loading
    }

    #[must_use]
    pub fn permission_status(&self) -> PermissionState {
        self.permission_status
    }

    fn cached_location(&self) -> Option<UserLocation> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!(error = %e, "session store unreadable; ignoring cache");
                return None;
            }
        };
        let location: UserLocation = match serde_json::from_str(&raw) {
            Ok(location) => location,
            Err(e) => {
                tracing::debug!(error = %e, "discarding malformed cached location");
                return None;
            }
        };

        let ttl_ms = i64::try_from(self.cache_ttl.as_millis()).unwrap_or(i64::MAX);
        let age_ms = now_millis() - location.timestamp;
        (0..ttl_ms).contains(&age_ms).then_some(location)
    }

    fn store_location(&self, location: &UserLocation) {
        let result = serde_json::to_string(location)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(SESSION_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed to cache user location");
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Great-circle distance in kilometres, or `None` if either point is absent.
#[must_use]
pub fn calculate_distance(from: Option<LatLng>, to: Option<LatLng>) -> Option<f64> {
    Some(haversine_km(from?, to?))
}

/// Pairs each clinic with its distance from `origin` and sorts nearest
/// first. Clinics without usable coordinates keep their relative order at
/// the end.
#[must_use]
pub fn rank_by_distance(clinics: &[Clinic], origin: LatLng) -> Vec<(&Clinic, Option<f64>)> {
    let mut ranked: Vec<_> = clinics
        .iter()
        .map(|c| (c, calculate_distance(Some(origin), c.coordinates())))
        .collect();
    ranked.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    ranked
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
