//! Layered settings: defaults < config file (YAML/JSON) < environment < CLI flags.
//!
//! Keys: interpreter, help_base_url, min_version, cran_mirror, auto_install.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const ENV_INTERPRETER: &str = "PACKRAT_R";
pub const ENV_PROJECT: &str = "PACKRAT_PROJECT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// R command line used for console runs, probes and status.
    pub interpreter: String,
    pub help_base_url: String,
    /// Minimum packrat version accepted by the dependency check.
    pub min_version: String,
    pub cran_mirror: String,
    /// Install packrat without asking.
    pub auto_install: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: "Rscript".to_string(),
            help_base_url: "https://www.rstudio.org/links/".to_string(),
            min_version: "0.4.1".to_string(),
            cran_mirror: "https://cloud.r-project.org".to_string(),
            auto_install: false,
        }
    }
}

impl Config {
    /// Defaults, or the file at `path` layered over them.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&raw, is_yaml(path))
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn parse(raw: &str, yaml: bool) -> Result<Self> {
        if yaml {
            // An empty YAML document means "all defaults".
            if raw.trim().is_empty() {
                return Ok(Self::default());
            }
            serde_yaml::from_str(raw).context("failed to parse YAML config")
        } else {
            serde_json::from_str(raw).context("failed to parse JSON config")
        }
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(interpreter) = lookup(ENV_INTERPRETER).filter(|s| !s.trim().is_empty()) {
            self.interpreter = interpreter;
        }
        self
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let c = Config::load(None).unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.interpreter, "Rscript");
    }

    #[test]
    fn yaml_overrides_some_keys() {
        let c = Config::parse("interpreter: R --no-echo\nauto_install: true\n", true).unwrap();
        assert_eq!(c.interpreter, "R --no-echo");
        assert!(c.auto_install);
        assert_eq!(c.min_version, "0.4.1");
    }

    #[test]
    fn empty_yaml_is_defaults() {
        assert_eq!(Config::parse("", true).unwrap(), Config::default());
    }

    #[test]
    fn json_config() {
        let c = Config::parse(r#"{ "cran_mirror": "https://cran.example" }"#, false).unwrap();
        assert_eq!(c.cran_mirror, "https://cran.example");
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(Config::parse("interpretr: R\n", true).is_err());
    }

    #[test]
    fn load_reads_file_by_extension() {
        let path = std::env::temp_dir()
            .join(format!("packrat-cmd-config-{}.yml", std::process::id()));
        std::fs::write(&path, "min_version: 0.5.0\n").unwrap();
        let loaded = Config::load(Some(&path));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.unwrap().min_version, "0.5.0");
    }

    #[test]
    fn env_overrides_interpreter() {
        let c = Config::default().with_env(|k| {
            (k == ENV_INTERPRETER).then(|| "/opt/R/bin/Rscript".to_string())
        });
        assert_eq!(c.interpreter, "/opt/R/bin/Rscript");

        let c = Config::default().with_env(|_| Some("  ".to_string()));
        assert_eq!(c.interpreter, "Rscript");
    }
}
