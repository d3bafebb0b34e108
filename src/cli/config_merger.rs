//! Merges CLI overrides onto file and environment configuration.
//!
//! Precedence, lowest first: configuration files, `PRENOTA_*` variables,
//! global flags (`--verbose`, `--quiet`), then `serve` options.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Loads the base configuration selected by `--config` and `--env`.
    ///
    /// # Errors
    /// Returns ConfigError if loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = &cli.config {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        let environment = loader.environment();
        Ok(Self::new(loader.load()?, environment))
    }

    /// Applies CLI overrides and validates the result
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
            }
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env::{self, EnvGuard};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn merger() -> ConfigurationMerger {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/prenota".to_string();
        ConfigurationMerger::new(config, Environment::Development)
    }

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        merger().merge_cli_args(&cli).unwrap()
    }

    #[test]
    fn test_global_flags_set_log_level() {
        assert_eq!(merge(&["prenota", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["prenota", "--quiet"]).logger.level, "error");
        assert_eq!(merge(&["prenota"]).logger.level, "info");
    }

    #[test]
    fn test_serve_overrides_host_and_port() {
        let settings = merge(&["prenota", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let settings = merge(&["prenota", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(settings.logger.level, "warn");
    }

    #[test]
    fn test_merged_config_is_validated() {
        let cli = Cli::try_parse_from(["prenota"]).unwrap();
        let merger = ConfigurationMerger::new(Settings::default(), Environment::Development);

        // No database URL configured
        assert!(matches!(
            merger.merge_cli_args(&cli),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_from_cli_reads_config_file_and_env() {
        let _lock = test_env::lock();
        let mut env = EnvGuard::new();
        env.clear_loader_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prenota.toml");
        fs::write(
            &path,
            "[database]\nurl = \"postgres://file/prenota\"\n\n[reservations]\nrevalidate_on_update = true\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "prenota",
            "--config",
            path.to_str().unwrap(),
            "--env",
            "staging",
        ])
        .unwrap();
        let merger = ConfigurationMerger::from_cli(&cli).unwrap();

        assert_eq!(merger.environment(), Environment::Staging);
        assert_eq!(merger.config().database.url, "postgres://file/prenota");
        assert!(merger.config().reservations.revalidate_on_update);
    }
}
