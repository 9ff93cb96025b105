pub mod error;
pub mod geocode;
pub(crate) mod retry;
pub mod search;
pub mod types;

pub use error::ApiError;
pub use geocode::{Geocoder, GoogleGeocoder};
pub use search::{ClinicApiClient, ClinicSearch};
