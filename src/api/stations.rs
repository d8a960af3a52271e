use tracing::info;

use crate::api::ApiError;
use crate::db::{PowerLevel, SlotConfig, Station, StationPatch, Store, STATIONS_KEY};
use crate::utils::geo::validate_coordinate;

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// All stations in insertion order
pub fn list(store: &Store) -> Vec<Station> {
    store.read_or(STATIONS_KEY, Vec::new())
}

pub fn get(store: &Store, id: &str) -> Result<Station, ApiError> {
    list(store)
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ApiError::StationNotFound(id.to_string()))
}

fn validate_slot_config(slots: &SlotConfig) -> Result<(), ApiError> {
    if slots.duration_mins == 0 {
        return Err(ApiError::InvalidSlotConfig(
            "duration must be at least one minute".to_string(),
        ));
    }
    Ok(())
}

/// Create or update a station.
///
/// A patch whose `id` matches an existing station is merged into it; any
/// other patch creates a new station under a freshly generated id.
pub fn upsert(store: &Store, patch: StationPatch) -> Result<Station, ApiError> {
    if patch.lat.is_some() || patch.lng.is_some() {
        validate_coordinate(patch.lat.unwrap_or(0.0), patch.lng.unwrap_or(0.0))?;
    }
    if let Some(slots) = &patch.slots {
        validate_slot_config(slots)?;
    }

    store.update(STATIONS_KEY, Vec::<Station>::new(), |stations| {
        let existing = patch
            .id
            .as_deref()
            .and_then(|id| stations.iter_mut().find(|s| s.id == id));

        let station = match existing {
            Some(station) => {
                patch.apply_to(station);
                info!(station_id = %station.id, "Updated station {}", station.name);
                station.clone()
            }
            None => {
                let station = patch.into_station(generate_id());
                info!(station_id = %station.id, "Created station {}", station.name);
                stations.push(station.clone());
                station
            }
        };
        Ok(station)
    })
}

/// Remove a station. Unknown ids are ignored.
pub fn delete(store: &Store, id: &str) -> Result<(), ApiError> {
    store.update(STATIONS_KEY, Vec::<Station>::new(), |stations| {
        let before = stations.len();
        stations.retain(|s| s.id != id);
        if stations.len() < before {
            info!(station_id = %id, "Deleted station");
        }
        Ok::<_, ApiError>(())
    })
}

/// Replace a station's slot configuration, clamping occupancy to the new
/// capacity
pub fn set_slot_config(
    store: &Store,
    id: &str,
    total: u32,
    duration_mins: u32,
) -> Result<Station, ApiError> {
    let slots = SlotConfig::new(total, duration_mins);
    validate_slot_config(&slots)?;

    store.update(STATIONS_KEY, Vec::<Station>::new(), |stations| {
        let station = stations
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::StationNotFound(id.to_string()))?;

        station.slots = slots;
        station.clamp_occupancy();

        info!(
            station_id = %id,
            total = total,
            duration_mins = duration_mins,
            occupied = station.live.occupied,
            "Saved slot configuration"
        );
        Ok(station.clone())
    })
}

/// Filter by a case-insensitive substring of name and address, and
/// optionally by power level
pub fn search(stations: Vec<Station>, query: &str, power: Option<PowerLevel>) -> Vec<Station> {
    let query = query.trim().to_lowercase();
    stations
        .into_iter()
        .filter(|s| {
            let text = format!("{} {}", s.name, s.address).to_lowercase();
            text.contains(&query) && power.map_or(true, |p| s.power == p)
        })
        .collect()
}

/// Order items nearest first by the distance `key` reports. Ties keep their
/// original order.
pub fn sort_by_distance<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LiveState;
    use crate::utils::geo::{distance_km, GeoPoint};

    fn new_station(name: &str, total: u32, occupied: u32) -> StationPatch {
        StationPatch {
            name: Some(name.to_string()),
            address: Some("12 Main St".to_string()),
            phone: Some("+1 555 100 100".to_string()),
            lat: Some(12.9716),
            lng: Some(77.5946),
            power: Some(PowerLevel::Fast),
            slots: Some(SlotConfig::new(total, 60)),
            live: Some(LiveState { occupied }),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_keeps_insertion_order() {
        let store = Store::in_memory();
        let a = upsert(&store, new_station("Alpha", 4, 0)).unwrap();
        let b = upsert(&store, new_station("Beta", 4, 0)).unwrap();

        let ids: Vec<String> = list(&store).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_create_applies_defaults() {
        let store = Store::in_memory();
        let station = upsert(
            &store,
            StationPatch {
                name: Some("Bare".to_string()),
                lat: Some(1.0),
                lng: Some(2.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!station.id.is_empty());
        assert_eq!(station.slots, SlotConfig::new(4, 60));
        assert_eq!(station.live.occupied, 0);
    }

    #[test]
    fn test_update_merges_supplied_fields_only() {
        let store = Store::in_memory();
        let created = upsert(&store, new_station("Alpha", 6, 2)).unwrap();

        upsert(
            &store,
            StationPatch {
                id: Some(created.id.clone()),
                name: Some("Alpha Prime".to_string()),
                power: Some(PowerLevel::Ultra),
                ..Default::default()
            },
        )
        .unwrap();

        let stations = list(&store);
        assert_eq!(stations.len(), 1);
        let updated = &stations[0];
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Alpha Prime");
        assert_eq!(updated.power, PowerLevel::Ultra);
        assert_eq!(updated.address, created.address);
        assert_eq!(updated.phone, created.phone);
        assert_eq!(updated.lat, created.lat);
        assert_eq!(updated.slots, created.slots);
        assert_eq!(updated.live, created.live);
    }

    #[test]
    fn test_unmatched_id_creates_new_station() {
        let store = Store::in_memory();
        let mut patch = new_station("Ghost", 4, 0);
        patch.id = Some("does-not-exist".to_string());

        let station = upsert(&store, patch).unwrap();

        assert_ne!(station.id, "does-not-exist");
        assert_eq!(list(&store).len(), 1);
    }

    #[test]
    fn test_upsert_rejects_bad_coordinates() {
        let store = Store::in_memory();
        let mut patch = new_station("Nowhere", 4, 0);
        patch.lat = Some(f64::NAN);

        let err = upsert(&store, patch).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCoordinate { .. }));
        assert!(list(&store).is_empty());
    }

    #[test]
    fn test_upsert_clamps_patched_occupancy() {
        let store = Store::in_memory();
        let station = upsert(&store, new_station("Alpha", 2, 9)).unwrap();
        assert_eq!(station.live.occupied, 2);
    }

    #[test]
    fn test_delete() {
        let store = Store::in_memory();
        let a = upsert(&store, new_station("Alpha", 4, 0)).unwrap();
        let b = upsert(&store, new_station("Beta", 4, 0)).unwrap();

        delete(&store, &a.id).unwrap();
        let remaining = list(&store);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);

        // Unknown id is a no-op
        delete(&store, "missing").unwrap();
        assert_eq!(list(&store).len(), 1);
    }

    #[test]
    fn test_set_slot_config_clamps_occupancy() {
        let store = Store::in_memory();
        let station = upsert(&store, new_station("Alpha", 6, 3)).unwrap();

        let updated = set_slot_config(&store, &station.id, 1, 30).unwrap();

        assert_eq!(updated.slots, SlotConfig::new(1, 30));
        assert_eq!(updated.live.occupied, 1);
        assert_eq!(get(&store, &station.id).unwrap().live.occupied, 1);
    }

    #[test]
    fn test_set_slot_config_growing_keeps_occupancy() {
        let store = Store::in_memory();
        let station = upsert(&store, new_station("Alpha", 4, 3)).unwrap();

        let updated = set_slot_config(&store, &station.id, 10, 45).unwrap();
        assert_eq!(updated.live.occupied, 3);
        assert_eq!(updated.vacancy(), 7);
    }

    #[test]
    fn test_set_slot_config_errors() {
        let store = Store::in_memory();
        assert!(matches!(
            set_slot_config(&store, "missing", 4, 60),
            Err(ApiError::StationNotFound(_))
        ));

        let station = upsert(&store, new_station("Alpha", 4, 0)).unwrap();
        assert!(matches!(
            set_slot_config(&store, &station.id, 4, 0),
            Err(ApiError::InvalidSlotConfig(_))
        ));
        assert_eq!(get(&store, &station.id).unwrap().slots, SlotConfig::new(4, 60));
    }

    #[test]
    fn test_upsert_rejects_zero_duration() {
        let store = Store::in_memory();
        let mut patch = new_station("Alpha", 4, 0);
        patch.slots = Some(SlotConfig::new(4, 0));
        assert!(matches!(
            upsert(&store, patch),
            Err(ApiError::InvalidSlotConfig(_))
        ));
        assert!(list(&store).is_empty());

        let station = upsert(&store, new_station("Alpha", 4, 1)).unwrap();
        let err = upsert(
            &store,
            StationPatch {
                id: Some(station.id.clone()),
                slots: Some(SlotConfig::new(2, 0)),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidSlotConfig(_)));
        assert_eq!(get(&store, &station.id).unwrap().slots, SlotConfig::new(4, 60));
    }

    #[test]
    fn test_search() {
        let store = Store::in_memory();
        upsert(&store, new_station("VoltHub Central", 4, 0)).unwrap();
        let mut slow = new_station("GreenCharge West", 4, 0);
        slow.address = Some("45 Lake Rd".to_string());
        slow.power = Some(PowerLevel::Slow);
        upsert(&store, slow).unwrap();

        assert_eq!(search(list(&store), "volthub", None).len(), 1);
        assert_eq!(search(list(&store), "LAKE", None).len(), 1);
        assert_eq!(search(list(&store), "", None).len(), 2);
        assert_eq!(search(list(&store), "", Some(PowerLevel::Slow)).len(), 1);
        assert!(search(list(&store), "volthub", Some(PowerLevel::Slow)).is_empty());
    }

    #[test]
    fn test_sort_by_distance() {
        let store = Store::in_memory();
        let mut far = new_station("Far", 4, 0);
        far.lat = Some(13.5);
        let far = upsert(&store, far).unwrap();
        let near = upsert(&store, new_station("Near", 4, 0)).unwrap();

        let origin = GeoPoint { lat: 12.97, lng: 77.59 };
        let mut stations = list(&store);
        sort_by_distance(&mut stations, |s| distance_km(origin, s.position()));

        assert_eq!(stations[0].id, near.id);
        assert_eq!(stations[1].id, far.id);
    }
}
