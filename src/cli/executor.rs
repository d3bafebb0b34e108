//! Dispatches the parsed command

use super::handlers::ServeCommandHandler;
use super::parser::{Cli, Commands};
use crate::config::{Environment, settings::Settings};

/// Runs the selected command; no subcommand means `serve`
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> anyhow::Result<()> {
    let command = cli.command.as_ref().unwrap_or(&DEFAULT_SERVE);

    match command {
        Commands::Serve { dry_run, .. } => {
            ServeCommandHandler::new(settings, environment)
                .execute(*dry_run)
                .await
        }
    }
}

static DEFAULT_SERVE: Commands = Commands::Serve {
    host: None,
    port: None,
    log_level: None,
    dry_run: false,
};

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/prenota".to_string();
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["prenota", "serve", "--dry-run"]).unwrap();
        let result = execute_command(&cli, valid_config(), Environment::Test).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_dry_run_surfaces_invalid_config() {
        let cli = Cli::try_parse_from(["prenota", "serve", "--dry-run"]).unwrap();
        let result = execute_command(&cli, Settings::default(), Environment::Test).await;
        assert!(result.is_err());
    }
}
