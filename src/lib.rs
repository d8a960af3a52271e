pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod ui;
pub mod utils;

pub use api::ApiError;
pub use db::Store;

use anyhow::Result;
use config::Config;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::db::{PowerLevel, Session, Station};
use crate::engine::SimulationTicker;
use crate::ui::{GeolocationProvider, MapRenderer, MapView, StationView};
use crate::utils::geo::GeoPoint;

/// Application context shared by the UI layer and background tasks.
///
/// Created once at startup. The current session lives in the store; the
/// attached map renderer and the user's position live here.
pub struct AppContext {
    pub config: Config,
    pub store: Store,
    map: RwLock<Option<Arc<dyn MapRenderer>>>,
    user_position: RwLock<Option<GeoPoint>>,
}

impl AppContext {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config,
            store,
            map: RwLock::new(None),
            user_position: RwLock::new(None),
        }
    }

    /// Open the configured store and seed demo data when enabled
    pub fn init(config: Config) -> Result<Self> {
        let store = db::init(&config.store)?;
        if config.seed.enabled {
            db::seed_demo_data(&store)?;
        }
        Ok(Self::new(config, store))
    }

    pub fn session(&self) -> Option<Session> {
        api::auth::current_session(&self.store)
    }

    /// Attach a map renderer and center it on the user, or the default center
    pub fn attach_map(&self, renderer: Arc<dyn MapRenderer>) {
        let center = self
            .user_position()
            .unwrap_or(self.config.map.default_center);
        renderer.set_center(center);
        *self.map.write() = Some(renderer);
    }

    pub fn detach_map(&self) {
        *self.map.write() = None;
    }

    pub fn user_position(&self) -> Option<GeoPoint> {
        *self.user_position.read()
    }

    pub fn set_user_position(&self, position: Option<GeoPoint>) {
        *self.user_position.write() = position;
        if let (Some(position), Some(map)) = (position, self.map.read().as_ref()) {
            map.set_center(position);
        }
    }

    /// Ask `provider` for the device position and remember it.
    /// A provider without a fix leaves the previous position in place.
    pub fn locate(&self, provider: &dyn GeolocationProvider) -> Option<GeoPoint> {
        match provider.current_position() {
            Some(position) => {
                self.set_user_position(Some(position));
                Some(position)
            }
            None => {
                tracing::debug!("Geolocation unavailable");
                self.user_position()
            }
        }
    }

    /// Filtered station listing, nearest first once the user position is known
    pub fn station_views(&self, query: &str, power: Option<PowerLevel>) -> Vec<StationView> {
        let stations = api::stations::search(api::stations::list(&self.store), query, power);
        ui::station_views(stations, self.user_position())
    }

    /// Push stations to the attached map, or build the schematic fallback
    pub fn refresh_map(&self, stations: &[Station]) -> MapView {
        let map = self.map.read().clone();
        ui::show_stations(map.as_deref(), stations)
    }

    /// Departure simulation over this context's store, not yet started
    pub fn ticker(&self) -> SimulationTicker {
        SimulationTicker::new(self.store.clone(), &self.config.simulation)
    }
}
