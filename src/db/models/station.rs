//! Charging station models.

use serde::{Deserialize, Serialize};

use crate::utils::geo::GeoPoint;

/// Slot capacity assigned to stations created without explicit config
pub const DEFAULT_SLOT_TOTAL: u32 = 4;
/// Nominal reservation length assigned to stations created without explicit config
pub const DEFAULT_DURATION_MINS: u32 = 60;

/// Charger power class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerLevel {
    #[default]
    Slow,
    Fast,
    Ultra,
}

impl std::fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerLevel::Slow => write!(f, "slow"),
            PowerLevel::Fast => write!(f, "fast"),
            PowerLevel::Ultra => write!(f, "ultra"),
        }
    }
}

impl std::str::FromStr for PowerLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "slow" => Ok(PowerLevel::Slow),
            "fast" => Ok(PowerLevel::Fast),
            "ultra" => Ok(PowerLevel::Ultra),
            _ => Err(format!("Unknown power level: {}", s)),
        }
    }
}

/// Administrator-set capacity and nominal session length.
///
/// `duration_mins` is descriptive only; bookings never expire on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    pub total: u32,
    pub duration_mins: u32,
}

impl SlotConfig {
    pub fn new(total: u32, duration_mins: u32) -> Self {
        Self {
            total,
            duration_mins,
        }
    }

    /// Used when a stored station carries no slot config at all
    fn unconfigured() -> Self {
        Self::new(0, DEFAULT_DURATION_MINS)
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_TOTAL, DEFAULT_DURATION_MINS)
    }
}

/// Live occupancy. Invariant: `occupied <= slots.total` of the owning station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiveState {
    pub occupied: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredStation")]
pub struct Station {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub lat: f64,
    pub lng: f64,
    pub power: PowerLevel,
    pub slots: SlotConfig,
    pub live: LiveState,
}

/// On-disk shape of a station. Loading goes through here so that a record
/// whose occupancy exceeds its capacity is clamped before anyone sees it.
#[derive(Deserialize)]
struct StoredStation {
    id: String,
    name: String,
    address: String,
    phone: String,
    lat: f64,
    lng: f64,
    power: PowerLevel,
    #[serde(default = "SlotConfig::unconfigured")]
    slots: SlotConfig,
    #[serde(default)]
    live: LiveState,
}

impl From<StoredStation> for Station {
    fn from(stored: StoredStation) -> Self {
        let mut station = Station {
            id: stored.id,
            name: stored.name,
            address: stored.address,
            phone: stored.phone,
            lat: stored.lat,
            lng: stored.lng,
            power: stored.power,
            slots: stored.slots,
            live: stored.live,
        };
        station.clamp_occupancy();
        station
    }
}

impl Station {
    /// Free slots, never negative
    pub fn vacancy(&self) -> u32 {
        self.slots.total.saturating_sub(self.live.occupied)
    }

    /// Pull `live.occupied` back inside `[0, slots.total]`
    pub fn clamp_occupancy(&mut self) {
        self.live.occupied = self.live.occupied.min(self.slots.total);
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Partial station update: only fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StationPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub power: Option<PowerLevel>,
    pub slots: Option<SlotConfig>,
    pub live: Option<LiveState>,
}

impl StationPatch {
    /// Shallow-merge supplied fields over `station`
    pub fn apply_to(&self, station: &mut Station) {
        if let Some(name) = &self.name {
            station.name = name.clone();
        }
        if let Some(address) = &self.address {
            station.address = address.clone();
        }
        if let Some(phone) = &self.phone {
            station.phone = phone.clone();
        }
        if let Some(lat) = self.lat {
            station.lat = lat;
        }
        if let Some(lng) = self.lng {
            station.lng = lng;
        }
        if let Some(power) = self.power {
            station.power = power;
        }
        if let Some(slots) = self.slots {
            station.slots = slots;
        }
        if let Some(live) = self.live {
            station.live = live;
        }
        station.clamp_occupancy();
    }

    /// Build a brand new station under `id`, filling gaps with defaults
    pub fn into_station(self, id: String) -> Station {
        let mut station = Station {
            id,
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            lat: 0.0,
            lng: 0.0,
            power: PowerLevel::default(),
            slots: SlotConfig::default(),
            live: LiveState::default(),
        };
        self.apply_to(&mut station);
        station
    }
}
