//! Fills in missing clinic coordinates from postal addresses.
//!
//! A batch runs in three steps so the network work can happen without
//! holding the owner mutably:
//!
//! 1. [`GeocodingCache::begin`] publishes the pass-through list and returns a
//!    [`GeocodeJob`] when something needs resolving.
//! 2. [`GeocodeJob::run`] consults the shared [`GeocodeCache`], looks up each
//!    distinct missing address once, concurrently, and merges in input order.
//! 3. [`GeocodingCache::apply`] installs the outcome unless a newer batch has
//!    started since.
//!
//! [`GeocodingCache::process`] does all three in sequence.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use clinicmap_api::Geocoder;
use clinicmap_core::{AddressQuery, Clinic, LatLng};
use futures::future::join_all;

/// Batch notice shown when at least one address could not be resolved.
pub const PARTIAL_FAILURE_NOTICE: &str = "Location data unavailable for some clinics";

/// Normalized address key → coordinates. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: Arc<Mutex<HashMap<String, LatLng>>>,
}

impl GeocodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<LatLng> {
        self.lock().get(key).copied()
    }

    pub fn insert(&self, key: String, coords: LatLng) {
        self.lock().insert(key, coords);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LatLng>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One batch of geocoding work, detached from the [`GeocodingCache`] that
/// started it.
pub struct GeocodeJob<G> {
    generation: u64,
    clinics: Arc<Vec<Clinic>>,
    geocoder: Arc<G>,
    cache: GeocodeCache,
}

/// Result of a [`GeocodeJob`].
#[derive(Debug, Clone)]
pub struct GeocodeOutcome {
    pub generation: u64,
    /// Input clinics in input order, enriched where possible.
    pub clinics: Vec<Clinic>,
    /// Clinics that needed coordinates and did not get them.
    pub failed: usize,
    /// Network lookups actually issued.
    pub lookups: usize,
}

impl<G> GeocodeJob<G>
where
    G: Geocoder,
{
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> GeocodeOutcome {
        let mut resolved: HashMap<String, LatLng> = HashMap::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<(String, AddressQuery)> = Vec::new();

        for clinic in self.clinics.iter().filter(|c| c.needs_geocoding()) {
            let Some(key) = clinic.address_key() else {
                continue;
            };
            if !seen.insert(key.clone()) {
                continue;
            }
            match self.cache.get(&key) {
                Some(coords) => {
                    resolved.insert(key, coords);
                }
                None => pending.push((key, clinic.address_query())),
            }
        }

        let geocoder = &self.geocoder;
        let lookups = join_all(pending.iter().map(|(key, query)| async move {
            (key, geocoder.geocode_address(query).await)
        }))
        .await;

        for (key, result) in lookups {
            match result {
                Ok(Some(coords)) => {
                    self.cache.insert(key.clone(), coords);
                    resolved.insert(key.clone(), coords);
                }
                Ok(None) => tracing::debug!(key, "address could not be geocoded"),
                Err(e) => tracing::warn!(key, error = %e, "geocoding request failed"),
            }
        }

        let mut failed = 0;
        let clinics = self
            .clinics
            .iter()
            .map(|clinic| {
                if !clinic.needs_geocoding() {
                    return clinic.clone();
                }
                let Some(key) = clinic.address_key() else {
                    tracing::debug!(clinic = %clinic.id, "clinic has no address to geocode");
                    return clinic.clone();
                };
                if let Some(coords) = resolved.get(&key) {
                    clinic.with_coordinates(*coords)
                } else {
                    failed += 1;
                    clinic.clone()
                }
            })
            .collect();

        GeocodeOutcome {
            generation: self.generation,
            clinics,
            failed,
            lookups: pending.len(),
        }
    }
}

/// Owns the enriched clinic list for the current search results.
pub struct GeocodingCache<G> {
    geocoder: Option<Arc<G>>,
    cache: GeocodeCache,
    input: Arc<Vec<Clinic>>,
    last_processed: Option<Arc<Vec<Clinic>>>,
    clinics_with_coords: Vec<Clinic>,
    geocoding: bool,
    geocoding_error: Option<String>,
    started: u64,
}

impl<G> GeocodingCache<G>
where
    G: Geocoder,
{
    /// `None` disables geocoding: every input passes through unchanged.
    #[must_use]
    pub fn new(geocoder: Option<G>) -> Self {
        Self::with_cache(geocoder, GeocodeCache::new())
    }

    #[must_use]
    pub fn with_cache(geocoder: Option<G>, cache: GeocodeCache) -> Self {
        Self {
            geocoder: geocoder.map(Arc::new),
            cache,
            input: Arc::default(),
            last_processed: None,
            clinics_with_coords: Vec::new(),
            geocoding: false,
            geocoding_error: None,
            started: 0,
        }
    }

    /// Accepts a new clinic list. Returns a job when some clinic needs a
    /// lookup; `None` when the list was already processed, geocoding is
    /// disabled or nothing is missing.
    pub fn begin(&mut self, clinics: Arc<Vec<Clinic>>) -> Option<GeocodeJob<G>> {
        if self
            .last_processed
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, &clinics))
        {
            tracing::debug!("clinic list already processed; skipping geocoding");
            return None;
        }
        self.last_processed = Some(Arc::clone(&clinics));
        self.input = Arc::clone(&clinics);
        self.clinics_with_coords = clinics.as_ref().clone();
        self.geocoding_error = None;
        self.geocoding = false;
        // Anything still in flight is now stale.
        self.started += 1;

        let geocoder = self.geocoder.as_ref()?;
        let missing = clinics
            .iter()
            .filter(|c| c.needs_geocoding() && c.address_key().is_some())
            .count();
        if missing == 0 {
            return None;
        }

        tracing::info!(
            generation = self.started,
            total = clinics.len(),
            missing,
            "geocoding clinic batch"
        );
        self.geocoding = true;
        Some(GeocodeJob {
            generation: self.started,
            clinics,
            geocoder: Arc::clone(geocoder),
            cache: self.cache.clone(),
        })
    }

    /// Installs a finished batch. Returns `false` and changes nothing if a
    /// newer batch has begun since `outcome` was started.
    pub fn apply(&mut self, outcome: GeocodeOutcome) -> bool {
        if outcome.generation != self.started {
            tracing::debug!(
                generation = outcome.generation,
                latest = self.started,
                "discarding stale geocoding batch"
            );
            return false;
        }

        tracing::info!(
            generation = outcome.generation,
            lookups = outcome.lookups,
            failed = outcome.failed,
            "geocoding batch applied"
        );
        self.clinics_with_coords = outcome.clinics;
        self.geocoding = false;
        self.geocoding_error = (outcome.failed > 0).then(|| PARTIAL_FAILURE_NOTICE.to_owned());
        true
    }

    /// Runs a full batch for `clinics`.
    pub async fn process(&mut self, clinics: Arc<Vec<Clinic>>) {
        if let Some(job) = self.begin(clinics) {
            let outcome = job.run().await;
            self.apply(outcome);
        }
    }

    /// Empties the address cache and forgets the last processed list, so the
    /// next call with the same list geocodes again.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.last_processed = None;
    }

    #[must_use]
    pub fn clinics_with_coords(&self) -> &[Clinic] {
        &self.clinics_with_coords
    }

    #[must_use]
    pub fn geocoding(&self) -> bool {
        self.geocoding
    }

    #[must_use]
    pub fn geocoding_error(&self) -> Option<&str> {
        self.geocoding_error.as_deref()
    }

    #[must_use]
    pub fn clinics_with_valid_coords(&self) -> Vec<&Clinic> {
        clinicmap_core::clinics_with_valid_coords(&self.clinics_with_coords)
    }

    #[must_use]
    pub fn clinics_without_coords(&self) -> Vec<&Clinic> {
        clinicmap_core::clinics_without_coords(&self.clinics_with_coords)
    }

    #[must_use]
    pub fn has_valid_coords(clinic: &Clinic) -> bool {
        clinic.has_valid_coords()
    }

    /// Share of the current input published so far, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn geocoding_progress(&self) -> f64 {
        if self.input.is_empty() {
            return 0.0;
        }
        self.clinics_with_coords.len() as f64 / self.input.len() as f64 * 100.0
    }

    #[must_use]
    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }
}

#[cfg(test)]
#[path = "geocoding_test.rs"]
mod tests;
