#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

//! Headless core of the branch-locator widget: a map view paired with a
//! synchronized list of offices. Shells bind the capability interfaces to a
//! concrete map widget and render both views from [`ViewModel`] snapshots.

pub mod capabilities;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::{App, Capabilities, Effect};
pub use capabilities::{
    MapOperation, MapView, Navigator, NavigatorOperation, Timer, TimerId, TimerOperation,
    TimerOutput,
};
pub use crux_core::{render::Render, App as CruxApp};

pub const DEFAULT_MAP_ZOOM: f64 = 10.0;
pub const SELECT_ZOOM: f64 = 15.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 20.0;
pub const HIGHLIGHT_DECAY_MS: u64 = 3000;
pub const MAPS_SEARCH_ENDPOINT: &str = "https://www.google.com/maps/search/";

#[derive(Debug, Clone, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCoordinate {
    lat: f64,
    lon: f64,
}

impl ValidatedCoordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }

    #[must_use]
    pub const fn as_tuple(self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

impl TryFrom<(f64, f64)> for ValidatedCoordinate {
    type Error = CoordinateError;

    fn try_from((lat, lon): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lon)
    }
}

impl TryFrom<LatLon> for ValidatedCoordinate {
    type Error = CoordinateError;

    fn try_from(value: LatLon) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lon)
    }
}

impl From<ValidatedCoordinate> for LatLon {
    fn from(coord: ValidatedCoordinate) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(self) -> Result<ValidatedCoordinate, CoordinateError> {
        ValidatedCoordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl LocationId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Stable key derived from the coordinate pair, so the same office keeps
    /// the same id across sessions without an external id scheme.
    #[must_use]
    pub fn from_coordinate(coordinate: ValidatedCoordinate) -> Self {
        Self(format!("{},{}", coordinate.lat(), coordinate.lon()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum LocationError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error("location name must not be empty")]
    EmptyName,
    #[error("location address must not be empty")]
    EmptyAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub coordinate: ValidatedCoordinate,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
}

impl Location {
    pub fn new(
        lat: f64,
        lon: f64,
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        email: Option<String>,
    ) -> Result<Self, LocationError> {
        let coordinate = ValidatedCoordinate::new(lat, lon)?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LocationError::EmptyName);
        }
        let address = address.into();
        if address.trim().is_empty() {
            return Err(LocationError::EmptyAddress);
        }
        Ok(Self {
            id: LocationId::from_coordinate(coordinate),
            coordinate,
            name,
            address,
            phone: phone.into(),
            email,
        })
    }

    /// Replaces the derived id with an explicit key.
    #[must_use]
    pub fn with_id(mut self, id: LocationId) -> Self {
        self.id = id;
        self
    }
}

/// Canonical location list plus the transient highlight flag. At most one
/// location is highlighted at any instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStore {
    locations: Vec<Location>,
    highlighted: Option<LocationId>,
}

impl LocationStore {
    #[must_use]
    pub fn new(locations: Vec<Location>) -> Self {
        Self {
            locations,
            highlighted: None,
        }
    }

    /// Stable configuration order; map markers and list rows both iterate
    /// this sequence, so row-to-marker correspondence is by id.
    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| &l.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &LocationId) -> bool {
        self.get(id).is_some()
    }

    pub fn highlight(&mut self, id: &LocationId) {
        if self.contains(id) {
            self.highlighted = Some(id.clone());
        }
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    #[must_use]
    pub fn is_highlighted(&self, id: &LocationId) -> bool {
        self.highlighted.as_ref() == Some(id)
    }

    #[must_use]
    pub fn highlighted_id(&self) -> Option<&LocationId> {
        self.highlighted.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLevel {
    value: f64,
}

impl ZoomLevel {
    #[must_use]
    pub fn new(value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            DEFAULT_MAP_ZOOM
        };
        Self { value }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.value
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_ZOOM)
    }
}

/// Where the map viewport starts out before any selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InitialView {
    Center { center: LatLon, zoom: f64 },
    #[default]
    FitAllMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub locations: Vec<Location>,
    #[serde(default)]
    pub initial_view: InitialView,
    /// `None` keeps a highlight until the next gesture instead of letting it
    /// fade after the delay.
    #[serde(default = "default_highlight_decay")]
    pub highlight_decay_ms: Option<u64>,
}

fn default_highlight_decay() -> Option<u64> {
    Some(HIGHLIGHT_DECAY_MS)
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            initial_view: InitialView::default(),
            highlight_decay_ms: Some(HIGHLIGHT_DECAY_MS),
        }
    }
}

#[derive(Debug)]
pub struct Model {
    pub store: LocationStore,
    /// Handle of the one live auto-clear timer; a decay notice carrying any
    /// other id is stale and must be ignored.
    pub pending_clear: Option<TimerId>,
    pub highlight_decay_ms: Option<u64>,
    pub initial_view: InitialView,
    pub map_ready: bool,
    pub map_center: Option<LatLon>,
    pub map_zoom: ZoomLevel,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            store: LocationStore::default(),
            pending_clear: None,
            highlight_decay_ms: Some(HIGHLIGHT_DECAY_MS),
            initial_view: InitialView::default(),
            map_ready: false,
            map_center: None,
            map_zoom: ZoomLevel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    #[default]
    Noop,

    Started { config: LocatorConfig },

    MapReady,
    MapMoved { center: LatLon, zoom: f64 },

    RowHoverEntered { id: LocationId },
    RowHoverLeft,
    RowSelected { id: LocationId },
    MarkerPressed { id: LocationId },

    HighlightDecayElapsed { id: TimerId },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Started { .. } => "started",
            Self::MapReady => "map_ready",
            Self::MapMoved { .. } => "map_moved",
            Self::RowHoverEntered { .. } => "row_hover_entered",
            Self::RowHoverLeft => "row_hover_left",
            Self::RowSelected { .. } => "row_selected",
            Self::MarkerPressed { .. } => "marker_pressed",
            Self::HighlightDecayElapsed { .. } => "highlight_decay_elapsed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RowHoverEntered { .. }
                | Self::RowHoverLeft
                | Self::RowSelected { .. }
                | Self::MarkerPressed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerView {
    pub id: LocationId,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    /// One-shot bounce animation while highlighted, static otherwise.
    pub bounce: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowView {
    pub id: LocationId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    /// Prebuilt href for the address link inside the row; link clicks stay
    /// isolated from the row's own select gesture.
    pub navigation_url: String,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub markers: Vec<MarkerView>,
    pub rows: Vec<RowView>,
    pub map_center: Option<LatLon>,
    pub map_zoom: f64,
    pub map_ready: bool,
}

pub mod app {
    use super::{
        Event, InitialView, LatLon, LocationStore, MarkerView, Model, RowView, TimerId, ViewModel,
        ZoomLevel, DEFAULT_MAP_ZOOM, SELECT_ZOOM,
    };
    use crate::capabilities::{search_url, MapView, Navigator, Render, Timer, TimerOutput};
    use tracing::{debug, info, trace, warn};

    #[derive(Default)]
    pub struct App;

    #[derive(crux_core::macros::Effect)]
    pub struct Capabilities {
        pub render: Render<Event>,
        pub map_view: MapView<Event>,
        pub navigator: Navigator<Event>,
        pub timer: Timer<Event>,
    }

    impl App {
        fn cancel_pending_clear(model: &mut Model, caps: &Capabilities) {
            if let Some(timer_id) = model.pending_clear.take() {
                caps.timer.cancel(timer_id);
            }
        }

        fn schedule_highlight_decay(model: &mut Model, caps: &Capabilities) {
            let Some(millis) = model.highlight_decay_ms else {
                return;
            };
            let timer_id = TimerId::generate();
            model.pending_clear = Some(timer_id);
            caps.timer.notify_after(timer_id, millis, |output| match output {
                TimerOutput::Elapsed { id } => Event::HighlightDecayElapsed { id },
                TimerOutput::Cleared { .. } => Event::Noop,
            });
        }

        fn issue_initial_view(model: &Model, caps: &Capabilities) {
            match &model.initial_view {
                InitialView::FitAllMarkers => {
                    let points: Vec<LatLon> = model
                        .store
                        .locations()
                        .iter()
                        .map(|l| l.coordinate.into())
                        .collect();
                    if !points.is_empty() {
                        caps.map_view.fit_bounds(points);
                    }
                }
                InitialView::Center { center, zoom } => match center.validate() {
                    Ok(coordinate) => {
                        caps.map_view.pan_to(coordinate);
                        caps.map_view.set_zoom(ZoomLevel::new(*zoom));
                    }
                    Err(e) => warn!(error = %e, "ignoring invalid initial center"),
                },
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            if event.is_user_initiated() {
                debug!(event = event.name(), "user gesture");
            } else {
                trace!(event = event.name(), "event");
            }

            match event {
                Event::Noop => {}

                Event::Started { config } => {
                    Self::cancel_pending_clear(model, caps);
                    model.store = LocationStore::new(config.locations);
                    model.highlight_decay_ms = config.highlight_decay_ms;
                    model.initial_view = config.initial_view;
                    model.map_ready = false;
                    model.map_center = None;
                    model.map_zoom = ZoomLevel::new(DEFAULT_MAP_ZOOM);
                    info!(locations = model.store.len(), "locator started");
                    caps.render.render();
                }

                Event::MapReady => {
                    model.map_ready = true;
                    Self::issue_initial_view(model, caps);
                    caps.render.render();
                }

                Event::MapMoved { center, zoom } => {
                    match center.validate() {
                        Ok(_) => model.map_center = Some(center),
                        Err(e) => warn!(error = %e, "ignoring out-of-range map center"),
                    }
                    model.map_zoom = ZoomLevel::new(zoom);
                }

                Event::RowHoverEntered { id } => {
                    if !model.store.contains(&id) {
                        debug!(%id, "hover for unknown location");
                        return;
                    }
                    Self::cancel_pending_clear(model, caps);
                    model.store.highlight(&id);
                    caps.render.render();
                }

                Event::RowHoverLeft => {
                    Self::cancel_pending_clear(model, caps);
                    model.store.clear_highlight();
                    caps.render.render();
                }

                Event::RowSelected { id } => {
                    let Some(location) = model.store.get(&id) else {
                        debug!(%id, "select for unknown location");
                        return;
                    };
                    let coordinate = location.coordinate;

                    Self::cancel_pending_clear(model, caps);
                    model.store.highlight(&id);

                    // Viewport commands are dropped, never queued, while the
                    // map widget is still loading.
                    if model.map_ready {
                        caps.map_view.pan_to(coordinate);
                        let zoom = if model.map_zoom.value() > SELECT_ZOOM {
                            model.map_zoom
                        } else {
                            ZoomLevel::new(SELECT_ZOOM)
                        };
                        caps.map_view.set_zoom(zoom);
                    }

                    Self::schedule_highlight_decay(model, caps);
                    caps.render.render();
                }

                Event::MarkerPressed { id } => {
                    let Some(location) = model.store.get(&id) else {
                        debug!(%id, "marker press for unknown location");
                        return;
                    };
                    let url = search_url(&location.address);
                    info!(%id, "opening external address search");
                    caps.navigator.open_external(url);
                }

                Event::HighlightDecayElapsed { id } => {
                    if model.pending_clear == Some(id) {
                        model.pending_clear = None;
                        model.store.clear_highlight();
                        caps.render.render();
                    } else {
                        debug!(%id, "stale decay timer ignored");
                    }
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let markers = model
                .store
                .locations()
                .iter()
                .map(|location| MarkerView {
                    id: location.id.clone(),
                    lat: location.coordinate.lat(),
                    lon: location.coordinate.lon(),
                    name: location.name.clone(),
                    bounce: model.store.is_highlighted(&location.id),
                })
                .collect();

            let rows = model
                .store
                .locations()
                .iter()
                .map(|location| RowView {
                    id: location.id.clone(),
                    name: location.name.clone(),
                    address: location.address.clone(),
                    phone: location.phone.clone(),
                    email: location.email.clone(),
                    navigation_url: search_url(&location.address),
                    emphasized: model.store.is_highlighted(&location.id),
                })
                .collect();

            ViewModel {
                markers,
                rows,
                map_center: model.map_center,
                map_zoom: model.map_zoom.value(),
                map_ready: model.map_ready,
            }
        }
    }
}
