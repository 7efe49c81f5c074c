//! Command-line flags and env-file selection.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::ConfigError;

/// Development env files, in lookup order.
const DEV_ENV_FILES: [&str; 2] = [".env.dev", ".env.development"];

#[derive(Debug, Parser)]
#[command(name = "freebie-worker", version, about = "Relay free storefront promotions to webhooks")]
pub struct Cli {
    /// Load `.env.dev` (or `.env.development`) instead of `.env`.
    #[arg(long)]
    pub dev: bool,

    /// Load variables from this file instead of `.env`.
    #[arg(long, value_name = "PATH", conflicts_with = "dev")]
    pub env_file: Option<PathBuf>,

    /// Fetch and evaluate, log the payload, but do not deliver or commit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Where environment variables are loaded from before configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSource {
    /// `.env` in the working directory, if present.
    Default,
    /// An explicitly selected file that must exist.
    File(PathBuf),
}

impl Cli {
    /// Resolve the env file relative to `dir`.
    pub fn env_source(&self, dir: &Path) -> Result<EnvSource, ConfigError> {
        if let Some(path) = &self.env_file {
            let path = dir.join(path);
            return if path.is_file() {
                Ok(EnvSource::File(path))
            } else {
                Err(ConfigError::EnvFileNotFound(path))
            };
        }

        if self.dev {
            return DEV_ENV_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file())
                .map(EnvSource::File)
                .ok_or_else(|| ConfigError::EnvFileNotFound(dir.join(DEV_ENV_FILES[0])));
        }

        Ok(EnvSource::Default)
    }

    /// Load the selected env file into the process environment.
    ///
    /// Variables already set in the environment are not overridden.
    pub fn load_env(&self) -> Result<EnvSource, ConfigError> {
        let source = self.env_source(Path::new("."))?;
        match &source {
            EnvSource::Default => {
                dotenvy::dotenv().ok();
            }
            EnvSource::File(path) => {
                dotenvy::from_path(path)?;
            }
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("freebie-worker").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_parse() {
        let cli = parse(&["--dry-run", "--env-file", "prod.env"]);
        assert!(cli.dry_run);
        assert!(!cli.dev);
        assert_eq!(cli.env_file.as_deref(), Some(Path::new("prod.env")));
    }

    #[test]
    fn dev_and_env_file_conflict() {
        let result = Cli::try_parse_from(["freebie-worker", "--dev", "--env-file", "x.env"]);
        assert!(result.is_err());
    }

    #[test]
    fn default_source_needs_no_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(parse(&[]).env_source(dir.path()).unwrap(), EnvSource::Default);
    }

    #[test]
    fn dev_prefers_env_dev_then_development() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&["--dev"]);

        assert_matches!(cli.env_source(dir.path()), Err(ConfigError::EnvFileNotFound(_)));

        std::fs::write(dir.path().join(".env.development"), "A=1\n").unwrap();
        assert_eq!(
            cli.env_source(dir.path()).unwrap(),
            EnvSource::File(dir.path().join(".env.development"))
        );

        std::fs::write(dir.path().join(".env.dev"), "A=2\n").unwrap();
        assert_eq!(
            cli.env_source(dir.path()).unwrap(),
            EnvSource::File(dir.path().join(".env.dev"))
        );
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&["--env-file", "custom.env"]);
        assert_matches!(cli.env_source(dir.path()), Err(ConfigError::EnvFileNotFound(_)));

        std::fs::write(dir.path().join("custom.env"), "A=1\n").unwrap();
        assert_eq!(
            cli.env_source(dir.path()).unwrap(),
            EnvSource::File(dir.path().join("custom.env"))
        );
    }
}
