pub mod app_config;
pub mod clinic;
pub mod config;
pub mod geo;

pub use app_config::{AppConfig, Environment};
pub use clinic::{
    clinics_with_valid_coords, clinics_without_coords, normalize_address_key, AddressQuery, Clinic,
    ClinicId,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{haversine_km, Bounds, LatLng, EARTH_RADIUS_KM};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinate pair \"{0}\": expected LAT,LNG")]
    InvalidCoordinates(String),

    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    CoordinatesOutOfRange { lat: f64, lng: f64 },
}
