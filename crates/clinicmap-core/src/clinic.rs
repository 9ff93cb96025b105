//! Clinic records as returned by the clinic search endpoint.
//!
//! The backend contract has drifted over time (camelCase vs snake_case,
//! numeric vs string IDs, coordinates as strings). All of that is absorbed
//! here, once, by a raw wire struct and lenient field deserializers, so that the
//! rest of the workspace sees a single canonical [`Clinic`] shape.

use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::LatLng;

/// Backend-assigned clinic identifier. Numeric IDs are kept as their decimal
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClinicId(pub String);

impl ClinicId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClinicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClinicId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ClinicId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// A dental clinic. Treated as an immutable value: enrichment goes through
/// [`Clinic::with_coordinates`], which returns a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawClinic")]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Wire shape with one slot per historical field name, so a record carrying
/// both an old and a new name for the same field still parses.
#[derive(Deserialize)]
struct RawClinic {
    id: ClinicId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default, rename = "addressLine1")]
    address_line1_camel: Option<String>,
    #[serde(default)]
    address_line1: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    province: Option<String>,
    #[serde(default, rename = "zipCode")]
    zip_code_camel: Option<String>,
    #[serde(default)]
    zip_code: Option<String>,
    #[serde(default, rename = "postalCode")]
    postal_code_camel: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    zip: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default, rename = "phoneNumber")]
    phone_number_camel: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lon: Option<f64>,
}

impl From<RawClinic> for Clinic {
    fn from(raw: RawClinic) -> Self {
        Self {
            id: raw.id,
            name: first_text([raw.name]).unwrap_or_default(),
            address: first_text([
                raw.address,
                raw.street,
                raw.address_line1_camel,
                raw.address_line1,
            ])
            .unwrap_or_default(),
            city: first_text([raw.city]).unwrap_or_default(),
            state: first_text([raw.state, raw.province]).unwrap_or_default(),
            zip_code: first_text([
                raw.zip_code_camel,
                raw.zip_code,
                raw.postal_code_camel,
                raw.postal_code,
                raw.zip,
            ])
            .unwrap_or_default(),
            country: first_text([raw.country]).unwrap_or_default(),
            phone_number: first_text([raw.phone_number_camel, raw.phone_number, raw.phone]),
            email: first_text([raw.email]),
            website: first_text([raw.website]),
            latitude: raw.latitude.or(raw.lat),
            longitude: raw.longitude.or(raw.lng).or(raw.lon),
        }
    }
}

/// First candidate that is not blank.
fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl Clinic {
    /// The clinic's position, if it carries a valid coordinate pair.
    #[must_use]
    pub fn coordinates(&self) -> Option<LatLng> {
        let point = LatLng::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }

    #[must_use]
    pub fn has_valid_coords(&self) -> bool {
        self.coordinates().is_some()
    }

    /// `true` when either coordinate is absent. A clinic with both present
    /// (even if out of range) is never sent to the geocoder.
    #[must_use]
    pub fn needs_geocoding(&self) -> bool {
        self.latitude.is_none() || self.longitude.is_none()
    }

    /// Returns a copy of this clinic carrying `coords`.
    #[must_use]
    pub fn with_coordinates(&self, coords: LatLng) -> Self {
        Self {
            latitude: Some(coords.lat),
            longitude: Some(coords.lng),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn address_query(&self) -> AddressQuery {
        AddressQuery {
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
        }
    }

    /// Cache key for this clinic's postal address; see [`normalize_address_key`].
    #[must_use]
    pub fn address_key(&self) -> Option<String> {
        self.address_query().normalized_key()
    }
}

/// The postal address fields sent to a geocoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl AddressQuery {
    fn parts(&self) -> [&str; 5] {
        [
            self.address.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.zip_code.as_str(),
            self.country.as_str(),
        ]
    }

    /// Human-readable single-line address, e.g.
    /// `"123 Main St, Springfield, IL, 62704, USA"`.
    #[must_use]
    pub fn formatted(&self) -> String {
        self.parts()
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn normalized_key(&self) -> Option<String> {
        normalize_address_key(&self.parts())
    }
}

/// Normalizes address parts into a cache key: each part trimmed, inner
/// whitespace collapsed and lowercased; empty parts dropped; the rest joined
/// with `,`. Returns `None` when every part is empty.
#[must_use]
pub fn normalize_address_key(parts: &[&str]) -> Option<String> {
    let normalized: Vec<String> = parts
        .iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.join(","))
    }
}

/// Clinics that can be placed on a map.
#[must_use]
pub fn clinics_with_valid_coords(clinics: &[Clinic]) -> Vec<&Clinic> {
    clinics.iter().filter(|c| c.has_valid_coords()).collect()
}

/// Clinics that stay list-only because they have no usable position.
#[must_use]
pub fn clinics_without_coords(clinics: &[Clinic]) -> Vec<&Clinic> {
    clinics.iter().filter(|c| !c.has_valid_coords()).collect()
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Number(f64),
        Text(String),
    }

    Ok(
        match Option::<RawNumber>::deserialize(deserializer)? {
            Some(RawNumber::Number(n)) => Some(n),
            Some(RawNumber::Text(s)) => s.trim().parse::<f64>().ok(),
            None => None,
        },
    )
}

#[cfg(test)]
#[path = "clinic_test.rs"]
mod tests;
