use clap::Parser;
use clinicmap_core::{Bounds, Clinic, ClinicId, LatLng};

use super::*;
use crate::viewport::zoom_for_bounds;

fn clinic(name: &str, city: &str, coords: Option<LatLng>) -> Clinic {
    Clinic {
        id: ClinicId::from(name),
        name: name.to_owned(),
        address: String::new(),
        city: city.to_owned(),
        state: String::new(),
        zip_code: String::new(),
        country: String::new(),
        phone_number: None,
        email: None,
        website: None,
        latitude: coords.map(|c| c.lat),
        longitude: coords.map(|c| c.lng),
    }
}

#[test]
fn parses_search_with_defaults() {
    let cli = Cli::try_parse_from(["clinicmap", "search", "dental"]).expect("valid args");
    assert!(matches!(
        cli.command,
        Commands::Search {
            ref keywords,
            near: None,
            no_geocode: false,
            limit: 20,
        } if keywords == "dental"
    ));
}

#[test]
fn parses_search_near_negative_latitude() {
    let cli = Cli::try_parse_from([
        "clinicmap",
        "search",
        "kids",
        "--near",
        "-33.87,151.21",
        "--no-geocode",
        "--limit",
        "5",
    ])
    .expect("valid args");
    match cli.command {
        Commands::Search {
            near: Some(near),
            no_geocode: true,
            limit: 5,
            ..
        } => assert_eq!(near, LatLng::new(-33.87, 151.21)),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn rejects_out_of_range_near() {
    let err = Cli::try_parse_from(["clinicmap", "search", "x", "--near", "95,0"]).unwrap_err();
    assert!(err.to_string().contains("out of range"), "got: {err}");
}

#[test]
fn parses_distance_points() {
    let cli = Cli::try_parse_from([
        "clinicmap",
        "distance",
        "-33.8688,151.2093",
        "-37.8136,144.9631",
    ])
    .expect("valid args");
    assert!(matches!(cli.command, Commands::Distance { .. }));
}

#[test]
fn parses_clear_location() {
    let cli = Cli::try_parse_from(["clinicmap", "clear-location"]).expect("valid args");
    assert!(matches!(cli.command, Commands::ClearLocation));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["clinicmap"]).is_err());
}

#[test]
fn format_distance_rounds_to_one_decimal() {
    assert_eq!(output::format_distance(Some(713.434)), "713.4 km");
    assert_eq!(output::format_distance(None), "-");
}

#[test]
fn render_clinics_lists_rows_in_given_order() {
    let near = clinic("Harbour Dental", "Sydney", Some(LatLng::new(-33.86, 151.21)));
    let far = clinic("Bayside Smiles", "Brighton", None);
    let rendered = output::render_clinics(&[(&near, Some(1.25)), (&far, None)]);

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("DISTANCE"));
    assert!(lines[1].starts_with("1.2 km") || lines[1].starts_with("1.3 km"));
    assert!(lines[1].contains("Harbour Dental"));
    assert!(lines[1].ends_with("-33.860000,151.210000"));
    assert!(lines[2].contains("Bayside Smiles"));
    assert!(lines[2].ends_with("no location"));
}

#[test]
fn render_clinics_truncates_long_names() {
    let long = clinic(&"A".repeat(50), "Sydney", None);
    let rendered = output::render_clinics(&[(&long, None)]);
    assert!(rendered.contains(&format!("{}...", "A".repeat(29))));
    assert!(!rendered.contains(&"A".repeat(33)));
}

#[test]
fn render_view_without_bounds() {
    let rendered = output::render_view(LatLng::new(1.0, 2.0), 12, None, None);
    assert!(rendered.contains("map center: 1.000000,2.000000 (zoom 12)"));
    assert!(rendered.contains("fit bounds: none"));
    assert!(!rendered.contains("your location"));
}

#[test]
fn zoom_for_single_point_is_max() {
    let bounds = Bounds::around(LatLng::new(-33.86, 151.21));
    assert_eq!(zoom_for_bounds(bounds), 21);
}

#[test]
fn zoom_for_city_sized_bounds() {
    let bounds = Bounds {
        south_west: LatLng::new(-34.0, 151.0),
        north_east: LatLng::new(-33.7, 151.3),
    };
    // 360 / 0.3 = 1200, log2 ~ 10.2
    assert_eq!(zoom_for_bounds(bounds), 10);
}

#[test]
fn zoom_for_world_bounds_is_zero() {
    let bounds = Bounds {
        south_west: LatLng::new(-90.0, -180.0),
        north_east: LatLng::new(90.0, 180.0),
    };
    assert_eq!(zoom_for_bounds(bounds), 0);
}
