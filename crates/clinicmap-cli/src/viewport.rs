use clinicmap_core::{Bounds, LatLng};
use clinicmap_finder::{ListenerId, MapEventKind, MapHandle};

/// Highest zoom level a web map tile pyramid offers.
const MAX_ZOOM: u8 = 21;

/// Headless map: tracks what a rendered map would show so the CLI can print
/// the resulting view.
#[derive(Debug, Default)]
pub(crate) struct Viewport {
    center: Option<LatLng>,
    zoom: Option<u8>,
    next_listener: u64,
}

impl MapHandle for Viewport {
    fn pan_to(&mut self, center: LatLng) {
        self.center = Some(center);
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = Some(zoom);
    }

    fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.center = Some(bounds.center());
        self.zoom = Some(zoom_for_bounds(bounds));
    }

    fn add_listener(&mut self, _kind: MapEventKind) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    fn remove_listener(&mut self, _id: ListenerId) {}
}

/// Largest zoom at which `bounds` still fits a 256px world tile.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn zoom_for_bounds(bounds: Bounds) -> u8 {
    let lat_span = bounds.north_east.lat - bounds.south_west.lat;
    let lng_span = bounds.north_east.lng - bounds.south_west.lng;
    let span = lat_span.max(lng_span);
    if span <= f64::EPSILON {
        return MAX_ZOOM;
    }
    (360.0 / span).log2().floor().clamp(0.0, f64::from(MAX_ZOOM)) as u8
}
