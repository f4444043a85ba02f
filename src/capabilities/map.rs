use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::{LatLon, ValidatedCoordinate, ZoomLevel};

/// Viewport commands for whatever map widget the shell embeds. All commands
/// are fire-and-forget: no completion, no retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "data")]
pub enum MapOperation {
    PanTo { position: LatLon },
    SetZoom { level: f64 },
    FitBounds { points: Vec<LatLon> },
}

impl Operation for MapOperation {
    type Output = ();
}

pub struct MapView<Ev> {
    context: CapabilityContext<MapOperation, Ev>,
}

impl<Ev> Capability<Ev> for MapView<Ev> {
    type Operation = MapOperation;
    type MappedSelf<MappedEv> = MapView<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        MapView::new(self.context.map_event(f))
    }
}

impl<Ev> MapView<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<MapOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn pan_to(&self, coordinate: ValidatedCoordinate) {
        self.notify(MapOperation::PanTo {
            position: coordinate.into(),
        });
    }

    pub fn set_zoom(&self, level: ZoomLevel) {
        self.notify(MapOperation::SetZoom {
            level: level.value(),
        });
    }

    pub fn fit_bounds(&self, points: Vec<LatLon>) {
        self.notify(MapOperation::FitBounds { points });
    }

    fn notify(&self, operation: MapOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_serialization() {
        let op = MapOperation::PanTo {
            position: LatLon::new(43.8561, -79.3370),
        };
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: MapOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }

    #[test]
    fn test_fit_bounds_serialization_keeps_point_order() {
        let op = MapOperation::FitBounds {
            points: vec![LatLon::new(1.0, 2.0), LatLon::new(3.0, 4.0)],
        };
        let json = serde_json::to_string(&op).unwrap();
        let MapOperation::FitBounds { points } = serde_json::from_str(&json).unwrap() else {
            panic!("expected fit_bounds");
        };
        assert_eq!(points[0], LatLon::new(1.0, 2.0));
        assert_eq!(points[1], LatLon::new(3.0, 4.0));
    }
}
