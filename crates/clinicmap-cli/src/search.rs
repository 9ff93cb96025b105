//! `search` and `clear-location` command handlers.
//!
//! A search runs the same pipeline a map page would: the coordinator fetches
//! clinics, the geocoding cache fills in missing positions, the geolocation
//! provider resolves the user's location and the map controller works out
//! the view.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clinicmap_api::{ClinicApiClient, GoogleGeocoder};
use clinicmap_core::{AppConfig, LatLng};
use clinicmap_finder::{
    rank_by_distance, FileSessionStore, FixedLocationProvider, GeocodingCache,
    GeolocationProvider, MapController, MapDefaults, MapEvent, PermissionState, SearchCoordinator,
    SearchError, StaticPermissions, UserLocation,
};

use crate::output;
use crate::viewport::Viewport;

#[derive(Debug)]
pub(crate) struct SearchArgs {
    pub keywords: String,
    pub near: Option<LatLng>,
    pub no_geocode: bool,
    pub limit: usize,
}

/// Search clinics, enrich them with coordinates and print them nearest first
/// when a location is known.
///
/// # Errors
///
/// Returns an error if the HTTP clients cannot be built or the search itself
/// fails. "No results" is reported on stdout, not as an error.
pub(crate) async fn run_search(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let client = ClinicApiClient::from_config(config).context("failed to build search client")?;
    let handle = SearchCoordinator::spawn(
        Arc::new(client),
        Duration::from_millis(config.search_debounce_ms),
    );

    handle.set_search_keywords(args.keywords.as_str());
    handle.handle_search();
    let state = handle
        .wait_for(|s| !s.loading && (s.last_searched.is_some() || s.error.is_some()))
        .await
        .context("search coordinator stopped before answering")?;

    match state.error {
        Some(SearchError::NoResults) => {
            println!("{}", SearchError::NoResults);
            return Ok(());
        }
        Some(err) => anyhow::bail!("{err}"),
        None => {}
    }

    let geocoder = if args.no_geocode {
        None
    } else {
        GoogleGeocoder::from_config(config).context("failed to build geocoder")?
    };
    let mut geocoding = GeocodingCache::new(geocoder);
    geocoding.process(Arc::new(state.clinics)).await;
    if let Some(notice) = geocoding.geocoding_error() {
        println!("note: {notice}");
    }

    let location = resolve_location(config, args.near).await;

    let mut map = MapController::new(MapDefaults::from_config(config));
    map.on_map_load(Viewport::default());
    if let Some(location) = location {
        map.apply_user_location(location.coords());
    }
    let bounds = map.fit_bounds_to_clinics(geocoding.clinics_with_coords());
    map.handle_map_event(MapEvent::BoundsChanged);

    let clinics = geocoding.clinics_with_coords();
    let rows = match location {
        Some(location) => rank_by_distance(clinics, location.coords()),
        None => clinics.iter().map(|c| (c, None)).collect(),
    };
    let shown = rows.len().min(args.limit);

    print!("{}", output::render_clinics(&rows[..shown]));
    if shown < rows.len() {
        println!("... {} more", rows.len() - shown);
    }
    println!();
    print!(
        "{}",
        output::render_view(
            map.map_center(),
            map.map_zoom(),
            bounds,
            location.as_ref()
        )
    );
    Ok(())
}

/// `--near` replaces the session-cached location; without it only a fresh
/// cached fix is used.
async fn resolve_location(config: &AppConfig, near: Option<LatLng>) -> Option<UserLocation> {
    let locator = near.map_or_else(FixedLocationProvider::unsupported, |point| {
        FixedLocationProvider::new(point, 0.0)
    });
    let mut geo = GeolocationProvider::new(locator, FileSessionStore::new(&config.session_path))
        .with_cache_ttl(Duration::from_secs(config.location_cache_ttl_secs))
        .with_permissions(StaticPermissions::new(PermissionState::Granted));

    if near.is_some() {
        geo.clear_location();
    }
    geo.mount().await;

    if let Some(err) = geo.location_error() {
        tracing::debug!(error = %err, "no user location; listing in search order");
    }
    geo.user_location()
}

/// Remove the cached user location from the session file.
pub(crate) fn run_clear_location(config: &AppConfig) {
    let store = FileSessionStore::new(&config.session_path);
    let mut geo = GeolocationProvider::new(FixedLocationProvider::unsupported(), store);
    geo.clear_location();
    println!(
        "cleared cached location ({})",
        config.session_path.display()
    );
}
