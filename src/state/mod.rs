pub mod game;
pub mod ledger;
pub mod live;
pub mod round;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::game_store::local::LocalGameStore,
    services::persistence::PersistenceGateway,
};

pub use self::live::LiveRound;
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, persistence and the rounds being played.
pub struct AppState {
    config: AppConfig,
    gateway: PersistenceGateway,
    events: SseHub,
    rounds: DashMap<Uuid, Arc<LiveRound>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The gateway starts offline until a remote store is installed.
    pub fn new(config: AppConfig, local: LocalGameStore) -> SharedState {
        let events = SseHub::default();
        let gateway = PersistenceGateway::new(local, config.score_range(), events.clone());
        Arc::new(Self {
            config,
            gateway,
            events,
            rounds: DashMap::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    /// Hub feeding the SSE streams.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Live rounds keyed by round id.
    pub fn rounds(&self) -> &DashMap<Uuid, Arc<LiveRound>> {
        &self.rounds
    }

    /// Whether saves currently land in the local store only.
    pub fn is_degraded(&self) -> bool {
        !self.gateway.is_online()
    }
}
