//! Map view state: center, zoom, selected clinic and info window.
//!
//! The map itself is external. [`MapController`] receives a [`MapHandle`]
//! through [`MapController::on_map_load`], drives it imperatively, and is
//! fed the map's events back through [`MapController::handle_map_event`].

use clinicmap_core::{AppConfig, Bounds, Clinic, ClinicId, LatLng};

/// Zoom applied when a clinic is picked from the list.
pub const SELECTED_CLINIC_ZOOM: u8 = 15;
/// Upper zoom bound after fitting the view to a set of clinics.
pub const MAX_FIT_ZOOM: u8 = 15;
/// Zoom used when centering on the user's location.
pub const USER_LOCATION_ZOOM: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    Click,
    BoundsChanged,
}

/// Events the map reports back. `Click` is a click on the map background;
/// marker clicks go to [`MapController::handle_marker_click`] instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    Click,
    BoundsChanged,
}

impl MapEvent {
    #[must_use]
    pub fn kind(self) -> MapEventKind {
        match self {
            Self::Click => MapEventKind::Click,
            Self::BoundsChanged => MapEventKind::BoundsChanged,
        }
    }
}

/// Imperative handle onto a rendered map.
pub trait MapHandle {
    fn pan_to(&mut self, center: LatLng);
    fn set_zoom(&mut self, zoom: u8);
    fn zoom(&self) -> Option<u8>;
    fn fit_bounds(&mut self, bounds: Bounds);
    fn add_listener(&mut self, kind: MapEventKind) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapDefaults {
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            center: LatLng::new(-33.8688, 151.2093),
            zoom: 12,
        }
    }
}

impl MapDefaults {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            center: config.default_center,
            zoom: config.default_zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    ClinicSelectedNoInfo,
    ClinicSelectedWithInfo,
}

pub struct MapController<M> {
    defaults: MapDefaults,
    center: LatLng,
    zoom: u8,
    selected: Option<ClinicId>,
    info_window_open: bool,
    pending_user_location: Option<LatLng>,
    map: Option<M>,
    click_listener: Option<ListenerId>,
    fit_listener: Option<ListenerId>,
}

impl<M: MapHandle> MapController<M> {
    #[must_use]
    pub fn new(defaults: MapDefaults) -> Self {
        Self {
            defaults,
            center: defaults.center,
            zoom: defaults.zoom,
            selected: None,
            info_window_open: false,
            pending_user_location: None,
            map: None,
            click_listener: None,
            fit_listener: None,
        }
    }

    /// Selection from the result list: info window closed, zoom in on the
    /// clinic when it has a position.
    pub fn handle_clinic_select(&mut self, clinic: &Clinic) {
        self.selected = Some(clinic.id.clone());
        self.info_window_open = false;
        if let Some(position) = clinic.coordinates() {
            self.move_to(position, Some(SELECTED_CLINIC_ZOOM));
        }
    }

    /// Selection from a map marker: info window open, pan without zooming.
    pub fn handle_marker_click(&mut self, clinic: &Clinic) {
        self.selected = Some(clinic.id.clone());
        self.info_window_open = true;
        if let Some(position) = clinic.coordinates() {
            self.move_to(position, None);
        }
    }

    /// Closes the info window; the clinic stays selected.
    pub fn handle_info_window_close(&mut self) {
        self.info_window_open = false;
    }

    /// Deselects and, if a user location arrived during the selection,
    /// recenters on it.
    pub fn clear_selection(&mut self) {
        self.deselect();
        if let Some(location) = self.pending_user_location.take() {
            self.center_on_user_location(location);
        }
    }

    /// Takes ownership of the rendered map and listens for background clicks.
    pub fn on_map_load(&mut self, mut map: M) {
        if self.map.is_some() {
            self.on_map_unmount();
        }
        self.click_listener = Some(map.add_listener(MapEventKind::Click));
        self.map = Some(map);
        tracing::debug!("map loaded");
    }

    /// Detaches listeners and hands the map back.
    pub fn on_map_unmount(&mut self) -> Option<M> {
        let mut map = self.map.take()?;
        for id in [self.click_listener.take(), self.fit_listener.take()]
            .into_iter()
            .flatten()
        {
            map.remove_listener(id);
        }
        tracing::debug!("map unmounted");
        Some(map)
    }

    pub fn handle_map_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::Click => {
                if self.click_listener.is_some() {
                    self.clear_selection();
                }
            }
            MapEvent::BoundsChanged => self.clamp_fit_zoom(),
        }
    }

    /// Fits the view to every clinic with a valid position. The zoom is
    /// capped at [`MAX_FIT_ZOOM`] once the map reports the new bounds.
    ///
    /// Returns the fitted bounds, or `None` when no clinic has a position.
    pub fn fit_bounds_to_clinics(&mut self, clinics: &[Clinic]) -> Option<Bounds> {
        let bounds = Bounds::from_points(clinics.iter().filter_map(Clinic::coordinates))?;
        self.center = bounds.center();

        if let Some(map) = self.map.as_mut() {
            if let Some(stale) = self.fit_listener.take() {
                map.remove_listener(stale);
            }
            map.fit_bounds(bounds);
            self.fit_listener = Some(map.add_listener(MapEventKind::BoundsChanged));
        }
        Some(bounds)
    }

    /// Explicit recenter on the user; ignores any selection.
    pub fn center_on_user_location(&mut self, location: LatLng) {
        self.pending_user_location = None;
        self.move_to(location, Some(USER_LOCATION_ZOOM));
    }

    /// Automatic recenter when a user location arrives. While a clinic is
    /// selected the location is held and applied by [`Self::clear_selection`].
    /// Returns whether the view moved.
    pub fn apply_user_location(&mut self, location: LatLng) -> bool {
        if self.selected.is_some() {
            tracing::debug!("clinic selected; deferring user location");
            self.pending_user_location = Some(location);
            return false;
        }
        self.center_on_user_location(location);
        true
    }

    /// Default center and zoom, nothing selected.
    pub fn reset_map_view(&mut self) {
        self.deselect();
        self.pending_user_location = None;
        self.move_to(self.defaults.center, Some(self.defaults.zoom));
    }

    #[must_use]
    pub fn selection_state(&self) -> SelectionState {
        match (&self.selected, self.info_window_open) {
            (None, _) => SelectionState::Idle,
            (Some(_), false) => SelectionState::ClinicSelectedNoInfo,
            (Some(_), true) => SelectionState::ClinicSelectedWithInfo,
        }
    }

    #[must_use]
    pub fn selected_clinic_id(&self) -> Option<&ClinicId> {
        self.selected.as_ref()
    }

    /// Looks the selection up in `clinics`.
    #[must_use]
    pub fn selected_clinic<'a>(&self, clinics: &'a [Clinic]) -> Option<&'a Clinic> {
        let id = self.selected.as_ref()?;
        clinics.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn map_center(&self) -> LatLng {
        self.center
    }

    #[must_use]
    pub fn map_zoom(&self) -> u8 {
        self.zoom
    }

    #[must_use]
    pub fn info_window_open(&self) -> bool {
        self.info_window_open
    }

    #[must_use]
    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    fn deselect(&mut self) {
        self.selected = None;
        self.info_window_open = false;
    }

    fn move_to(&mut self, center: LatLng, zoom: Option<u8>) {
        self.center = center;
        if let Some(zoom) = zoom {
            self.zoom = zoom;
        }
        if let Some(map) = self.map.as_mut() {
            map.pan_to(center);
            if let Some(zoom) = zoom {
                map.set_zoom(zoom);
            }
        }
    }

    fn clamp_fit_zoom(&mut self) {
        let Some(id) = self.fit_listener.take() else {
            return;
        };
        let Some(map) = self.map.as_mut() else {
            return;
        };
        match map.zoom() {
            Some(current) if current > MAX_FIT_ZOOM => {
                map.set_zoom(MAX_FIT_ZOOM);
                self.zoom = MAX_FIT_ZOOM;
            }
            Some(current) => self.zoom = current,
            None => {}
        }
        map.remove_listener(id);
    }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod tests;
