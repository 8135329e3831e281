use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Session sweeper configuration
#[derive(Clone)]
pub struct SweeperConfig {
    /// How often to scan the session store
    pub sweep_interval: std::time::Duration,
    /// How long a session may sit idle before it is evicted
    pub session_ttl: chrono::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: std::time::Duration::from_secs(60),
            session_ttl: chrono::Duration::minutes(60),
        }
    }
}

/// Background task that evicts idle playback sessions.
///
/// Clients abandon sessions without cleaning up (a closed browser tab never
/// sends DELETE), so the sweeper periodically drops anything idle past the
/// configured TTL to keep slots available under the session cap.
pub struct Sweeper {
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
    config: SweeperConfig,
}

impl Sweeper {
    /// Create a new sweeper with default timing
    pub fn new(state: Arc<AppState>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            state,
            shutdown,
            config: SweeperConfig::default(),
        }
    }

    /// Set sweeper configuration
    pub fn with_config(mut self, config: SweeperConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the sweeper - evicts idle sessions until shutdown is signalled
    pub async fn run(mut self) {
        info!("Session sweeper started");

        let mut ticker = tokio::time::interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.state.sessions.evict_idle(self.config.session_ttl);
                    if evicted > 0 {
                        info!("Evicted {} idle session(s)", evicted);
                    }
                }
                _ = self.shutdown.changed() => break,
            }
        }

        info!("Session sweeper stopped");
    }
}

/// Create the shutdown signal pair used to stop the sweeper
pub fn create_shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionStore;
    use crate::story::{SceneSession, StoryLibrary};
    use std::fs;

    fn test_state() -> Arc<AppState> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("characters.md"),
            "# Characters\n\n## Stella\n- Voice: sage\n- Prompt: An astronaut.\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("scenes")).unwrap();
        fs::write(
            dir.path().join("scenes").join("rocket_intro.md"),
            "# Rocket to the Stars\n\nNarrator: Tonight we fly.\n",
        )
        .unwrap();

        let library = StoryLibrary::load(dir.path()).unwrap();
        Arc::new(AppState {
            library,
            sessions: SessionStore::new(8),
        })
    }

    #[tokio::test]
    async fn test_sweeper_evicts_and_stops() {
        let state = test_state();
        let scene = state.library.scene("rocket_intro").unwrap();
        state.sessions.insert(SceneSession::new(scene)).unwrap();

        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let sweeper = Sweeper::new(state.clone(), shutdown_rx).with_config(SweeperConfig {
            sweep_interval: std::time::Duration::from_millis(10),
            session_ttl: chrono::Duration::zero(),
        });
        let handle = tokio::spawn(sweeper.run());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(state.sessions.is_empty());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
