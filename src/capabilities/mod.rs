//! Capability interfaces the core drives but does not implement: map
//! viewport commands, external navigation, and the highlight decay timer.

mod map;
mod navigator;
mod timer;

pub use self::map::{MapOperation, MapView};
pub use self::navigator::{search_url, Navigator, NavigatorOperation};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

pub use crux_core::render::Render;

use crate::Event;

pub type AppRender = Render<Event>;
pub type AppMapView = MapView<Event>;
pub type AppNavigator = Navigator<Event>;
pub type AppTimer = Timer<Event>;
