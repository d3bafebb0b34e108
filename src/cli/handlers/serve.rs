//! Serve command handler

use std::time::Duration;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::db::lazy_connection_pool;
use crate::server::Server;
use crate::state::AppState;

pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Runs the server, or only validates the setup when `dry_run` is set
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()
        } else {
            Server::new(self.config, self.environment).run().await
        }
    }

    /// Checks configuration and assembles the router without touching the
    /// database or binding a socket
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;
        self.config.logger.clone().into_logger_config()?;

        let pool = lazy_connection_pool(&self.config.database);
        let state = AppState::new(pool, self.config.reservations);
        let _router = create_router(
            state,
            Duration::from_secs(self.config.server.request_timeout),
        );

        println!("✓ Configuration is valid ({})", self.environment);
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Reservation policies: revalidate_on_update={}, enforce_status_transitions={}, available_listing_excludes_maintenance={}",
            self.config.reservations.revalidate_on_update,
            self.config.reservations.enforce_status_transitions,
            self.config.reservations.available_listing_excludes_maintenance,
        );
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
