// Map renderer and geolocation collaborators

use serde::{Deserialize, Serialize};

use crate::db::Station;
use crate::utils::geo::GeoPoint;

/// What a map renderer needs to place one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

impl From<&Station> for MapMarker {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            lat: station.lat,
            lng: station.lng,
            name: station.name.clone(),
        }
    }
}

/// A mapping provider. The core never depends on which one is attached.
pub trait MapRenderer: Send + Sync {
    /// Replace all markers with `markers`, in order
    fn render_markers(&self, markers: &[MapMarker]);

    fn set_center(&self, center: GeoPoint);
}

/// Supplies the device position, when the platform has one
pub trait GeolocationProvider: Send + Sync {
    fn current_position(&self) -> Option<GeoPoint>;
}

/// Outcome of refreshing the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// A renderer drew this many markers
    Rendered(usize),
    /// No renderer attached; textual listing of positions
    Schematic(String),
}

pub const SCHEMATIC_HEADER: &str = "Map not available. Showing schematic positions.";

/// Textual fallback listing each marker with its coordinates
pub fn render_schematic(markers: &[MapMarker]) -> String {
    let mut out = String::from(SCHEMATIC_HEADER);
    for marker in markers {
        out.push('\n');
        out.push_str(&format!(
            "{} ({:.4}, {:.4})",
            marker.name, marker.lat, marker.lng
        ));
    }
    out
}

/// Hand station markers to `renderer`, or fall back to the schematic listing
pub fn show_stations(renderer: Option<&dyn MapRenderer>, stations: &[Station]) -> MapView {
    let markers: Vec<MapMarker> = stations.iter().map(MapMarker::from).collect();
    match renderer {
        Some(renderer) => {
            renderer.render_markers(&markers);
            MapView::Rendered(markers.len())
        }
        None => MapView::Schematic(render_schematic(&markers)),
    }
}
