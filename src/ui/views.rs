// Station view models shown in listings and detail panels

use serde::Serialize;

use crate::api::stations::sort_by_distance;
use crate::db::Station;
use crate::utils::geo::{distance_km, format_distance, GeoPoint};

#[derive(Debug, Clone, Serialize)]
pub struct StationView {
    pub station: Station,
    pub vacancy: u32,
    /// "3 free" or "Full"
    pub availability: String,
    pub distance_km: Option<f64>,
    pub distance_label: Option<String>,
}

impl StationView {
    pub fn new(station: Station, origin: Option<GeoPoint>) -> Self {
        let vacancy = station.vacancy();
        let distance_km = origin.map(|o| distance_km(o, station.position()));
        Self {
            availability: availability_label(vacancy),
            distance_label: distance_km.map(format_distance),
            distance_km,
            vacancy,
            station,
        }
    }

    /// "2 free / 6", as shown in the booking panel
    pub fn vacancy_detail(&self) -> String {
        format!("{} free / {}", self.vacancy, self.station.slots.total)
    }

    /// "Slots: 6 · Duration: 60 mins", as shown in the admin slot summary
    pub fn slot_summary(&self) -> String {
        format!(
            "Slots: {} · Duration: {} mins",
            self.station.slots.total, self.station.slots.duration_mins
        )
    }
}

pub fn availability_label(vacancy: u32) -> String {
    if vacancy == 0 {
        "Full".to_string()
    } else {
        format!("{} free", vacancy)
    }
}

/// Build views for `stations`, nearest first when `origin` is known.
/// Without an origin the input order is kept.
pub fn station_views(stations: Vec<Station>, origin: Option<GeoPoint>) -> Vec<StationView> {
    let mut views: Vec<StationView> = stations
        .into_iter()
        .map(|s| StationView::new(s, origin))
        .collect();

    if origin.is_some() {
        sort_by_distance(&mut views, |v| v.distance_km.unwrap_or(f64::INFINITY));
    }
    views
}
