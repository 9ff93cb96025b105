//! Client-side coordination for the clinic finder: debounced search,
//! current-location tracking, address geocoding and map view state.

pub mod geocoding;
pub mod geolocation;
pub mod map;
pub mod search;

pub use geocoding::{GeocodeCache, GeocodeJob, GeocodeOutcome, GeocodingCache};
pub use geolocation::{
    calculate_distance, rank_by_distance, FileSessionStore, FixedLocationProvider,
    GeolocationProvider, LocationProvider, MemorySessionStore, PermissionProvider,
    PermissionState, Position, PositionError, PositionOptions, SessionStore, SessionStoreError,
    StaticPermissions, UserLocation,
};
pub use map::{
    ListenerId, MapController, MapDefaults, MapEvent, MapEventKind, MapHandle, SelectionState,
};
pub use search::{SearchCoordinator, SearchError, SearchHandle, SearchState};
