use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Where pipeline artifacts live for one target source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpec {
    /// Source file under analysis (and mutation, for refactors)
    pub source_file: PathBuf,

    /// Generated test suite destination
    pub test_file: PathBuf,

    /// Import path test code should use for the target module
    pub import_path: String,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            source_file: PathBuf::from("autotest_target_file.py"),
            test_file: PathBuf::from("test_suite.py"),
            import_path: "autotest_target_file".to_string(),
        }
    }
}

impl TargetSpec {
    /// Specialize the configured target for a concrete source path.
    /// An empty configured import path is derived from the file stem.
    pub fn for_source(&self, source_file: &Path) -> Self {
        let import_path = if self.import_path.is_empty() {
            source_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            self.import_path.clone()
        };

        Self {
            source_file: source_file.to_path_buf(),
            test_file: self.test_file.clone(),
            import_path,
        }
    }
}

/// Marker sets driving the testability classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Substrings indicating user interaction (matched case-insensitively)
    pub interaction: Vec<String>,

    /// Substrings indicating internal computation
    pub logic: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            interaction: ["input(", "print(", "sys.stdin", "sys.stdout"]
                .map(String::from)
                .to_vec(),
            logic: [
                "=", "+", "-", "*", "/", "%", "**", "try:", "except", "if ", "for ", "while ",
                "return", "yield", "assert",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default pipeline target
    pub target: TargetSpec,

    /// Classifier marker sets
    pub markers: MarkerConfig,
}

/// Load configuration from `refract.toml` (then `.refract.toml`) plus
/// `REFRACT_`-prefixed environment variables. Absent files fall back to
/// defaults via `#[serde(default)]`.
pub fn load_config() -> Result<Config> {
    let mut builder = config::Config::builder();

    let config_paths = ["refract.toml", ".refract.toml"];
    for path in &config_paths {
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
            break;
        }
    }

    builder = builder.add_source(config::Environment::with_prefix("REFRACT").separator("_"));

    let cfg = builder.build().context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

/// Write a default `refract.toml` into `dir`. Refuses to clobber an
/// existing file unless `force` is set.
pub fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join("refract.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_matches_legacy_layout() {
        let target = TargetSpec::default();
        assert_eq!(target.source_file, PathBuf::from("autotest_target_file.py"));
        assert_eq!(target.test_file, PathBuf::from("test_suite.py"));
        assert_eq!(target.import_path, "autotest_target_file");
    }

    #[test]
    fn for_source_derives_import_path_from_stem() {
        let base = TargetSpec {
            import_path: String::new(),
            ..TargetSpec::default()
        };
        let target = base.for_source(Path::new("pkg/billing.py"));
        assert_eq!(target.source_file, PathBuf::from("pkg/billing.py"));
        assert_eq!(target.import_path, "billing");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.markers.interaction, config.markers.interaction);
        assert_eq!(parsed.target.import_path, config.target.import_path);
    }
}
