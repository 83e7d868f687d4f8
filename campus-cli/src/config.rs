use anyhow::{Context, Result};
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Production backend
pub const DEFAULT_API_URL: &str = "https://futo-campus-media-backend.onrender.com/api";

/// Optional settings file, looked up in the working directory and then in
/// the data directory
pub const SETTINGS_FILE: &str = "campus.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    /// Where the local store and log live (defaults to `~/.campus`)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    /// Explicit settings file, which must exist
    pub settings_file: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings by priority:
    /// 1. Overrides (CLI flags and their environment variables)
    /// 2. Settings file
    /// 3. Built-in defaults
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().set_default("api.url", DEFAULT_API_URL)?;

        if let Some(path) = &overrides.settings_file {
            builder = builder.add_source(File::from(path.clone()).required(true));
        } else {
            let current_dir_path = PathBuf::from(SETTINGS_FILE);
            if current_dir_path.exists() {
                builder = builder.add_source(File::from(current_dir_path).required(false));
            } else if let Ok(dir) = default_data_dir() {
                let data_dir_path = dir.join(SETTINGS_FILE);
                if data_dir_path.exists() {
                    builder = builder.add_source(File::from(data_dir_path).required(false));
                }
            }
        }

        if let Some(url) = &overrides.api_url {
            builder = builder.set_override("api.url", url.as_str())?;
        }
        if let Some(dir) = &overrides.data_dir {
            builder = builder.set_override("storage.data_dir", dir.to_string_lossy().to_string())?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    pub fn api_url(&self) -> &str {
        &self.api.url
    }

    /// Configured data directory, or `~/.campus`
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// Data directory, created if missing
    pub fn ensure_data_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir()?;
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        }
        Ok(dir)
    }
}

/// Get the `.campus` directory in the user's home
pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home_dir.join(".campus"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_settings_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            "[api]\nurl = \"http://localhost:8000/api\"\n\n[storage]\ndata_dir = \"/tmp/campus-test\"\n",
        );

        let settings = Settings::load(&Overrides {
            settings_file: Some(path),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(settings.api_url(), "http://localhost:8000/api");
        assert_eq!(settings.data_dir().unwrap(), PathBuf::from("/tmp/campus-test"));
    }

    #[test]
    fn test_overrides_beat_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, "[api]\nurl = \"http://localhost:8000/api\"\n");

        let settings = Settings::load(&Overrides {
            api_url: Some("http://override:9000/api".to_string()),
            data_dir: Some(dir.path().join("data")),
            settings_file: Some(path),
        })
        .unwrap();

        assert_eq!(settings.api_url(), "http://override:9000/api");
        assert_eq!(settings.data_dir().unwrap(), dir.path().join("data"));

        let created = settings.ensure_data_dir().unwrap();
        assert!(created.is_dir());
    }

    #[test]
    fn test_missing_explicit_settings_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Settings::load(&Overrides {
            settings_file: Some(dir.path().join("nope.toml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_api_url_defaults_when_file_omits_it() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, "[storage]\ndata_dir = \"/tmp/x\"\n");

        let settings = Settings::load(&Overrides {
            settings_file: Some(path),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(settings.api_url(), DEFAULT_API_URL);
    }
}
