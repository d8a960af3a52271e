//! Demo data seeders
//!
//! Populates an empty store with a demo admin, a demo user and a handful of
//! stations so the app is usable on first launch. Collections that already
//! hold data are left alone.

use tracing::info;

use super::{
    LiveState, PowerLevel, Role, SlotConfig, Station, Store, StoreError, User, STATIONS_KEY,
    USERS_KEY,
};

/// What a seeding pass added
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub users: usize,
    pub stations: usize,
}

/// Seed demo users and stations into whichever collections are empty
pub fn seed_demo_data(store: &Store) -> Result<SeedStats, StoreError> {
    let mut stats = SeedStats::default();

    // Format: (name, email, password, role)
    let users: Vec<(&str, &str, &str, Role)> = vec![
        ("Admin", "admin@ev.app", "admin123", Role::Admin),
        ("Jane EV", "user@ev.app", "user1234", Role::User),
    ];

    store.update_if_changed(USERS_KEY, Vec::<User>::new(), |existing| {
        if !existing.is_empty() {
            return false;
        }
        for (name, email, password, role) in &users {
            existing.push(User {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password.to_string(),
                role: *role,
            });
        }
        stats.users = existing.len();
        true
    })?;

    // Format: (name, address, phone, lat, lng, power, total, duration_mins, occupied)
    let stations: Vec<(&str, &str, &str, f64, f64, PowerLevel, u32, u32, u32)> = vec![
        (
            "VoltHub Central",
            "12 Main St, Downtown",
            "+1 555 100 100",
            12.9716,
            77.5946,
            PowerLevel::Fast,
            6,
            60,
            2,
        ),
        (
            "GreenCharge West",
            "45 Lake Rd, Westside",
            "+1 555 200 200",
            12.9352,
            77.6245,
            PowerLevel::Slow,
            4,
            45,
            1,
        ),
        (
            "UltraSpark East",
            "99 Tech Park, East",
            "+1 555 300 300",
            12.9141,
            77.6387,
            PowerLevel::Ultra,
            8,
            30,
            5,
        ),
    ];

    store.update_if_changed(STATIONS_KEY, Vec::<Station>::new(), |existing| {
        if !existing.is_empty() {
            return false;
        }
        for (name, address, phone, lat, lng, power, total, duration_mins, occupied) in &stations {
            existing.push(Station {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                address: address.to_string(),
                phone: phone.to_string(),
                lat: *lat,
                lng: *lng,
                power: *power,
                slots: SlotConfig::new(*total, *duration_mins),
                live: LiveState {
                    occupied: *occupied,
                },
            });
        }
        stats.stations = existing.len();
        true
    })?;

    if stats.users > 0 || stats.stations > 0 {
        info!(
            users = stats.users,
            stations = stats.stations,
            "Seeded demo data"
        );
    }
    Ok(stats)
}
