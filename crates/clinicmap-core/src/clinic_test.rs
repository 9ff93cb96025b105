use super::*;

fn clinic(id: &str) -> Clinic {
    Clinic {
        id: ClinicId::from(id),
        name: "Harbour Dental".to_string(),
        address: "123 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip_code: "62704".to_string(),
        country: "USA".to_string(),
        phone_number: None,
        email: None,
        website: None,
        latitude: None,
        longitude: None,
    }
}

#[test]
fn deserializes_camel_case_payload() {
    let json = serde_json::json!({
        "id": 7,
        "name": "Bright Smiles",
        "address": "1 George St",
        "city": "Sydney",
        "state": "NSW",
        "zipCode": "2000",
        "country": "Australia",
        "phoneNumber": "+61 2 5550 1234",
        "email": "hello@brightsmiles.example",
        "website": "https://brightsmiles.example",
        "latitude": -33.8688,
        "longitude": 151.2093
    });
    let clinic: Clinic = serde_json::from_value(json).unwrap();
    assert_eq!(clinic.id.as_str(), "7");
    assert_eq!(clinic.zip_code, "2000");
    assert_eq!(clinic.phone_number.as_deref(), Some("+61 2 5550 1234"));
    assert_eq!(clinic.coordinates(), Some(LatLng::new(-33.8688, 151.2093)));
}

#[test]
fn deserializes_legacy_field_names() {
    let json = serde_json::json!({
        "id": "c-42",
        "name": "Legacy Dental",
        "postal_code": "3000",
        "phone": "555-0100",
        "lat": "-37.8136",
        "lng": "144.9631"
    });
    let clinic: Clinic = serde_json::from_value(json).unwrap();
    assert_eq!(clinic.id.as_str(), "c-42");
    assert_eq!(clinic.zip_code, "3000");
    assert_eq!(clinic.phone_number.as_deref(), Some("555-0100"));
    assert_eq!(clinic.latitude, Some(-37.8136));
    assert_eq!(clinic.longitude, Some(144.9631));
    assert!(clinic.address.is_empty());
}

#[test]
fn null_and_garbage_coordinates_become_none() {
    let json = serde_json::json!({
        "id": 1,
        "latitude": null,
        "longitude": "not-a-number"
    });
    let clinic: Clinic = serde_json::from_value(json).unwrap();
    assert!(clinic.latitude.is_none());
    assert!(clinic.longitude.is_none());
    assert!(clinic.needs_geocoding());
}

#[test]
fn address_key_ignores_case_and_spacing() {
    let a = clinic("a");
    let mut b = clinic("b");
    b.address = "  123   MAIN st ".to_string();
    b.city = "SPRINGFIELD".to_string();
    b.country = "usa".to_string();
    assert_eq!(a.address_key(), b.address_key());
    assert_eq!(
        a.address_key().as_deref(),
        Some("123 main st,springfield,il,62704,usa")
    );
}

#[test]
fn address_key_drops_empty_parts() {
    let mut c = clinic("a");
    c.state = String::new();
    c.zip_code = "   ".to_string();
    assert_eq!(
        c.address_key().as_deref(),
        Some("123 main st,springfield,usa")
    );
}

#[test]
fn address_key_is_none_without_address() {
    let json = serde_json::json!({ "id": 3, "name": "Nowhere Dental" });
    let clinic: Clinic = serde_json::from_value(json).unwrap();
    assert!(clinic.address_key().is_none());
}

#[test]
fn formatted_address_joins_non_empty_parts() {
    let mut c = clinic("a");
    c.state = String::new();
    assert_eq!(
        c.address_query().formatted(),
        "123 Main St, Springfield, 62704, USA"
    );
}

#[test]
fn with_coordinates_leaves_original_untouched() {
    let original = clinic("a");
    let enriched = original.with_coordinates(LatLng::new(39.78, -89.65));
    assert!(original.latitude.is_none());
    assert_eq!(enriched.coordinates(), Some(LatLng::new(39.78, -89.65)));
    assert_eq!(enriched.name, original.name);
}

#[test]
fn out_of_range_coordinates_are_not_valid_but_not_geocoded() {
    let mut c = clinic("a");
    c.latitude = Some(123.0);
    c.longitude = Some(10.0);
    assert!(!c.has_valid_coords());
    assert!(!c.needs_geocoding());
}

#[test]
fn splits_clinics_by_coordinate_validity() {
    let with = clinic("a").with_coordinates(LatLng::new(1.0, 2.0));
    let without = clinic("b");
    let clinics = vec![with.clone(), without.clone()];
    let valid = clinics_with_valid_coords(&clinics);
    let missing = clinics_without_coords(&clinics);
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, with.id);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].id, without.id);
}

#[test]
fn duplicate_field_names_prefer_the_first_non_empty() {
    let raw = r#"{
        "id": 1,
        "name": "Twin Dental",
        "address": "",
        "street": "9 Pitt St",
        "zipCode": "2000",
        "postalCode": "2001",
        "phoneNumber": " ",
        "phone": "555-0199",
        "latitude": -33.8,
        "lat": -34.0,
        "lng": 151.2,
        "lon": 150.0
    }"#;
    let clinic: Clinic = serde_json::from_str(raw).unwrap();
    assert_eq!(clinic.address, "9 Pitt St");
    assert_eq!(clinic.zip_code, "2000");
    assert_eq!(clinic.phone_number.as_deref(), Some("555-0199"));
    assert_eq!(clinic.coordinates(), Some(LatLng::new(-33.8, 151.2)));
}

#[test]
fn unparseable_coordinate_falls_back_to_legacy_name() {
    let json = serde_json::json!({
        "id": 2,
        "latitude": "n/a",
        "lat": "-37.8136",
        "longitude": -144.0,
        "lng": 144.9631
    });
    let clinic: Clinic = serde_json::from_value(json).unwrap();
    assert_eq!(clinic.latitude, Some(-37.8136));
    assert_eq!(clinic.longitude, Some(-144.0));
}

#[test]
fn null_text_fields_read_as_empty() {
    let json = serde_json::json!({ "id": 3, "name": null, "city": null, "email": null });
    let clinic: Clinic = serde_json::from_value(json).unwrap();
    assert!(clinic.name.is_empty());
    assert!(clinic.city.is_empty());
    assert!(clinic.email.is_none());
}

#[test]
fn missing_id_is_rejected() {
    let json = serde_json::json!({ "name": "No Id Dental" });
    assert!(serde_json::from_value::<Clinic>(json).is_err());
}

#[test]
fn serialized_clinic_reads_back() {
    let original = clinic("a").with_coordinates(LatLng::new(39.78, -89.65));
    let json = serde_json::to_value(&original).unwrap();
    assert_eq!(json["zipCode"], "62704");
    let back: Clinic = serde_json::from_value(json).unwrap();
    assert_eq!(back, original);
}
