//! Slot booking.
//!
//! A booking is a plain occupancy increment: no reservation record, booker
//! identity or expiry is kept.

use tracing::info;

use crate::api::ApiError;
use crate::db::{Station, Store, STATIONS_KEY};

/// Free slots at `station`
pub fn vacancy(station: &Station) -> u32 {
    station.vacancy()
}

/// Take one slot at the station, failing with `NoVacancy` when it is full
pub fn book(store: &Store, station_id: &str) -> Result<Station, ApiError> {
    store.update(STATIONS_KEY, Vec::<Station>::new(), |stations| {
        let station = stations
            .iter_mut()
            .find(|s| s.id == station_id)
            .ok_or_else(|| ApiError::StationNotFound(station_id.to_string()))?;

        if vacancy(station) == 0 {
            return Err(ApiError::NoVacancy(station_id.to_string()));
        }

        station.live.occupied += 1;
        info!(
            station_id = %station_id,
            occupied = station.live.occupied,
            total = station.slots.total,
            "Slot booked"
        );
        Ok(station.clone())
    })
}
