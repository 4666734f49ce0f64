//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::engine::CatalogCommand;
use crate::error::{CatalogError, CatalogResult};

/// Script name looked up under the project root.
pub const SCRIPT_NAME: &str = "universe.php";

pub const MIN_REFRESH_SECONDS: f64 = 1.0;
pub const MAX_REFRESH_SECONDS: f64 = 3600.0;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "universe-browser")]
#[command(about = "Browse and animate universe simulator catalogs", long_about = None)]
#[command(version)]
pub struct Config {
    /// PHP interpreter used to run the simulator
    #[arg(long, env = "UNIVERSE_PHP", default_value = "php")]
    pub php: String,
    /// Directory containing universe.php
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
    #[arg(long)]
    pub seed: Option<String>,
    #[arg(long)]
    pub galaxies: Option<u32>,
    #[arg(long)]
    pub systems_per_galaxy: Option<u32>,
    #[arg(long)]
    pub planets_per_system: Option<u32>,
    /// Simulator worker processes. Default: available parallelism
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long, default_value_t = 50)]
    pub people_limit: u32,
    #[arg(long, default_value_t = 12)]
    pub chronicle_limit: u32,
    /// Seconds between silent catalog refreshes (1 to 3600)
    #[arg(long, default_value_t = 10.0, value_parser = parse_refresh_seconds)]
    pub refresh_seconds: f64,
    /// Start with auto-refresh enabled
    #[arg(long)]
    pub auto_refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            php: "php".into(),
            project_root: PathBuf::from("."),
            seed: None,
            galaxies: None,
            systems_per_galaxy: None,
            planets_per_system: None,
            workers: None,
            people_limit: 50,
            chronicle_limit: 12,
            refresh_seconds: 10.0,
            auto_refresh: false,
        }
    }
}

impl Config {
    pub fn script_path(&self) -> PathBuf {
        self.project_root.join(SCRIPT_NAME)
    }

    /// The catalog invocation for the current settings.
    ///
    /// Fails with a process failure, before anything is spawned, when the
    /// simulator script is missing.
    pub fn catalog_command(&self) -> CatalogResult<CatalogCommand> {
        let script = self.script_path();
        if !script.is_file() {
            return Err(CatalogError::ProcessFailure {
                message: format!("Unable to locate {} at {}.", SCRIPT_NAME, script.display()),
                stdout_preview: String::new(),
                stderr: String::new(),
            });
        }
        Ok(CatalogCommand::new(
            self.php_program(),
            self.catalog_args(&script.to_string_lossy()),
            self.project_root.clone(),
        ))
    }

    /// Arguments following the interpreter, script path first.
    pub fn catalog_args(&self, script: &str) -> Vec<String> {
        let mut args = vec![
            script.to_string(),
            "catalog".to_string(),
            "--format=json".to_string(),
            format!("--people-limit={}", self.people_limit),
            format!("--chronicle-limit={}", self.chronicle_limit),
        ];
        if let Some(seed) = self.seed.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            args.push(format!("--seed={}", seed));
        }
        if let Some(n) = self.galaxies {
            args.push(format!("--galaxies={}", n));
        }
        if let Some(n) = self.systems_per_galaxy {
            args.push(format!("--systems-per-galaxy={}", n));
        }
        if let Some(n) = self.planets_per_system {
            args.push(format!("--planets-per-system={}", n));
        }
        args.push(format!("--workers={}", self.worker_count()));
        args
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|n| *n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(clamp_refresh_seconds(self.refresh_seconds))
    }

    fn php_program(&self) -> String {
        let php = self.php.trim();
        if php.is_empty() { "php".to_string() } else { php.to_string() }
    }
}

/// Refresh period in seconds, within [`MIN_REFRESH_SECONDS`] and
/// [`MAX_REFRESH_SECONDS`]. NaN falls back to the minimum.
pub fn clamp_refresh_seconds(seconds: f64) -> f64 {
    if seconds.is_nan() {
        MIN_REFRESH_SECONDS
    } else {
        seconds.clamp(MIN_REFRESH_SECONDS, MAX_REFRESH_SECONDS)
    }
}

fn parse_refresh_seconds(raw: &str) -> Result<f64, String> {
    let seconds: f64 = raw.trim().parse().map_err(|e| format!("{}", e))?;
    if (MIN_REFRESH_SECONDS..=MAX_REFRESH_SECONDS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(format!(
            "must be between {} and {} seconds",
            MIN_REFRESH_SECONDS, MAX_REFRESH_SECONDS
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_with_defaults() {
        let config = Config::parse_from(["universe-browser", "--php", "php8", "--seed", "42", "--galaxies", "3"]);
        assert_eq!(config.php, "php8");
        assert_eq!(config.seed.as_deref(), Some("42"));
        assert_eq!(config.people_limit, 50);
        assert_eq!(config.refresh_seconds, 10.0);
        assert!(!config.auto_refresh);
    }

    #[test]
    fn catalog_args_follow_simulator_cli() {
        let config = Config {
            seed: Some(" 7 ".into()),
            planets_per_system: Some(4),
            workers: Some(2),
            ..Config::default()
        };
        assert_eq!(
            config.catalog_args("/sim/universe.php"),
            vec![
                "/sim/universe.php",
                "catalog",
                "--format=json",
                "--people-limit=50",
                "--chronicle-limit=12",
                "--seed=7",
                "--planets-per-system=4",
                "--workers=2",
            ]
        );
    }

    #[test]
    fn missing_script_fails_before_spawn() {
        let config = Config {
            project_root: PathBuf::from("/definitely/not/a/simulator"),
            ..Config::default()
        };
        match config.catalog_command().unwrap_err() {
            CatalogError::ProcessFailure { message, .. } => assert!(message.contains("universe.php")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn refresh_interval_is_bounded() {
        let mut config = Config::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        config.refresh_seconds = 0.2;
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(clamp_refresh_seconds(f64::NAN), 1.0);
        config.refresh_seconds = 1e20;
        assert_eq!(config.refresh_interval(), Duration::from_secs(3600));
        assert_eq!(clamp_refresh_seconds(f64::INFINITY), MAX_REFRESH_SECONDS);
    }

    #[test]
    fn refresh_flag_is_range_checked() {
        let ok = Config::try_parse_from(["universe-browser", "--refresh-seconds", "30"]).unwrap();
        assert_eq!(ok.refresh_seconds, 30.0);
        assert!(Config::try_parse_from(["universe-browser", "--refresh-seconds", "1e20"]).is_err());
        assert!(Config::try_parse_from(["universe-browser", "--refresh-seconds", "0.5"]).is_err());
        assert!(Config::try_parse_from(["universe-browser", "--refresh-seconds", "soon"]).is_err());
    }

    #[test]
    fn worker_count_defaults_to_parallelism() {
        assert!(Config::default().worker_count() >= 1);
        let zero = Config { workers: Some(0), ..Config::default() };
        assert!(zero.worker_count() >= 1);
    }
}
