// Wipe configuration
//
// Settings are layered: built-in defaults, then an optional TOML file, then
// WIPEME_* environment variables (e.g. WIPEME_CHUNK_SIZE=4194304).

use crate::{WipeError, WipeResult, GIB, MIB};
use ::config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "WIPEME";

/// What the progress channel does when the consumer falls behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressPolicy {
    /// Wait for the consumer; throttles the writer to the consumer's pace
    Block,
    /// Drop the update and keep writing
    DropWhenFull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WipeConfig {
    /// Size of the reusable write buffer
    pub chunk_size: usize,
    /// Upper bound for a single temp wipe file before rolling over
    pub max_file_size: u64,
    /// Lower bound of the safety buffer
    pub min_safety_buffer: u64,
    /// Safety buffer is free space divided by this, unless below the minimum
    pub safety_buffer_divisor: u64,
    /// Name of the temporary directory created under the volume root
    pub temp_dir_name: String,
    /// fsync each wipe file before closing it
    pub sync_files: bool,
    /// Delete a pass's files before the next pass of the same phase starts
    pub recycle_pass_files: bool,
    /// Capacity of the progress channel used by background wipes
    pub progress_capacity: usize,
    pub progress_policy: ProgressPolicy,
}

impl Default for WipeConfig {
    fn default() -> Self {
        Self {
            chunk_size: MIB as usize,
            max_file_size: 256 * MIB,
            min_safety_buffer: GIB,
            safety_buffer_divisor: 10,
            temp_dir_name: ".wipeme_temp".to_string(),
            sync_files: true,
            recycle_pass_files: true,
            progress_capacity: 1024,
            progress_policy: ProgressPolicy::DropWhenFull,
        }
    }
}

impl WipeConfig {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// An explicit `path` must exist; without one the per-user config file is
    /// used when present.
    pub fn load(path: Option<&Path>) -> WipeResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&WipeConfig::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        let config: WipeConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(?config, "Loaded wipe configuration");
        Ok(config)
    }

    /// Per-user configuration file (e.g. ~/.config/wipeme/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "wipeme").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> WipeResult<()> {
        if self.chunk_size == 0 {
            return Err(WipeError::Config("chunk_size must be greater than zero".into()));
        }
        if self.max_file_size < self.chunk_size as u64 {
            return Err(WipeError::Config(format!(
                "max_file_size ({}) must be at least chunk_size ({})",
                self.max_file_size, self.chunk_size
            )));
        }
        if self.safety_buffer_divisor == 0 {
            return Err(WipeError::Config(
                "safety_buffer_divisor must be greater than zero".into(),
            ));
        }
        if self.min_safety_buffer == 0 {
            return Err(WipeError::Config(
                "min_safety_buffer must be greater than zero".into(),
            ));
        }
        if self.progress_capacity == 0 {
            return Err(WipeError::Config(
                "progress_capacity must be greater than zero".into(),
            ));
        }

        let name = self.temp_dir_name.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || !name.starts_with('.')
        {
            return Err(WipeError::Config(format!(
                "temp_dir_name '{}' must be a single dot-prefixed directory name",
                name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file() -> NamedTempFile {
        tempfile::Builder::new().suffix(".toml").tempfile().unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = WipeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1024 * 1024);
        assert_eq!(config.min_safety_buffer, GIB);
        assert_eq!(config.safety_buffer_divisor, 10);
        assert!(config.temp_dir_name.starts_with('.'));
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let config = WipeConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(WipeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_file_smaller_than_chunk() {
        let config = WipeConfig {
            chunk_size: 4096,
            max_file_size: 1024,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_temp_dir_names() {
        for name in ["", ".", "..", "wipe_temp", ".a/b", ".a\\b"] {
            let config = WipeConfig {
                temp_dir_name: name.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", name);
        }
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = toml_file();
        writeln!(file, "chunk_size = 65536").unwrap();
        writeln!(file, "sync_files = false").unwrap();
        writeln!(file, "progress_policy = \"block\"").unwrap();
        file.flush().unwrap();

        let config = WipeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.chunk_size, 65536);
        assert!(!config.sync_files);
        assert_eq!(config.progress_policy, ProgressPolicy::Block);
        // Untouched keys keep their defaults
        assert_eq!(config.min_safety_buffer, GIB);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let mut file = toml_file();
        writeln!(file, "chunk_size = 65536").unwrap();
        file.flush().unwrap();

        std::env::set_var("WIPEME_CHUNK_SIZE", "131072");
        let result = WipeConfig::load(Some(file.path()));
        std::env::remove_var("WIPEME_CHUNK_SIZE");

        assert_eq!(result.unwrap().chunk_size, 131072);
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file_fails() {
        let result = WipeConfig::load(Some(Path::new("/nonexistent/wipeme/config.toml")));
        assert!(matches!(result, Err(WipeError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_values() {
        let mut file = toml_file();
        writeln!(file, "temp_dir_name = \"not-hidden\"").unwrap();
        file.flush().unwrap();

        assert!(WipeConfig::load(Some(file.path())).is_err());
    }
}
