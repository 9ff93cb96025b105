//! Plain-text rendering for command output.

use std::fmt::Write as _;

use clinicmap_core::{Bounds, Clinic, LatLng};
use clinicmap_finder::UserLocation;

const NAME_WIDTH: usize = 32;

/// `"713.4 km"`, or `"-"` when unknown.
pub(crate) fn format_distance(km: Option<f64>) -> String {
    km.map_or_else(|| "-".to_string(), |km| format!("{km:.1} km"))
}

fn format_position(clinic: &Clinic) -> String {
    clinic
        .coordinates()
        .map_or_else(|| "no location".to_string(), |p| p.to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// One line per clinic: distance, name, city and position.
pub(crate) fn render_clinics(rows: &[(&Clinic, Option<f64>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}{:<w$}{:<20}POSITION",
        "DISTANCE",
        "NAME",
        "CITY",
        w = NAME_WIDTH + 2
    );
    for (clinic, km) in rows {
        let _ = writeln!(
            out,
            "{:<10}{:<w$}{:<20}{}",
            format_distance(*km),
            truncate(&clinic.name, NAME_WIDTH),
            truncate(&clinic.city, 18),
            format_position(clinic),
            w = NAME_WIDTH + 2
        );
    }
    out
}

/// The map view a browser would show for these results.
pub(crate) fn render_view(
    center: LatLng,
    zoom: u8,
    bounds: Option<Bounds>,
    user: Option<&UserLocation>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "map center: {center} (zoom {zoom})");
    match bounds {
        Some(b) => {
            let _ = writeln!(out, "fit bounds: {} to {}", b.south_west, b.north_east);
        }
        None => {
            let _ = writeln!(out, "fit bounds: none (no clinic has a location)");
        }
    }
    if let Some(user) = user {
        let _ = writeln!(
            out,
            "your location: {} (±{:.0} m)",
            user.coords(),
            user.accuracy
        );
    }
    out
}
