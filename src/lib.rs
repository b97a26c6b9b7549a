//! combatd - HemiMUD combat daemon
//!
//! Runs the combat resolution engine against an in-memory world, one
//! round per tick.

pub mod combat;
pub mod config;
pub mod sim;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use combat::CombatManager;
use sim::{LogPublisher, Respawner, SimWorld};

pub use config::Config;

/// The combatd server instance
pub struct Server {
    config: Config,
    world: Arc<SimWorld>,
    manager: Arc<CombatManager>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Build the world and start the configured engagements
    pub fn new(config: Config) -> Result<Self> {
        let world = Arc::new(SimWorld::from_config(&config.world)?);
        let publisher = Arc::new(LogPublisher);
        let manager = CombatManager::shared(
            world.clone(),
            publisher.clone(),
            Arc::new(Respawner::new(world.clone(), publisher)),
        );

        let started = world.start_engagements(&manager, &config.world.engagements);
        info!("{} fights started", started);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            world,
            manager,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the combat manager
    pub fn manager(&self) -> Arc<CombatManager> {
        self.manager.clone()
    }

    /// Get the world
    pub fn world(&self) -> Arc<SimWorld> {
        self.world.clone()
    }

    /// Tick until shutdown, `max_ticks`, or no fights remain.
    /// Returns the number of rounds run.
    pub async fn run(&self) -> Result<u64> {
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut ticks = 0u64;

        info!(
            "combatd ticking every {}ms",
            self.config.tick_interval_ms
        );

        loop {
            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                info!("tick limit reached");
                break;
            }
            if self.manager.fight_count() == 0 {
                info!("no fights remaining");
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    let summary = self.manager.tick();
                    ticks += 1;
                    debug!(tick = ticks, ?summary, "round complete");
                }
                _ = shutdown_rx.changed() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        info!("combatd stopped after {} rounds", ticks);
        Ok(ticks)
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Handle that triggers shutdown from another task
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }
}
