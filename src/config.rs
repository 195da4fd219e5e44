use crate::error::{CropwiseError, Result};
use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OWM_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub farm: FarmConfig,
    pub openweathermap: OpenWeatherMapConfig,
    #[serde(default)]
    pub soil_classifier: Option<SoilClassifierConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FarmConfig {
    /// Owner recorded on saved recommendations
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Used by `detect`/`auto` when no coordinates are given
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn default_owner() -> String {
    "local".into()
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    #[serde(default = "default_owm_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_owm_base_url() -> String {
    DEFAULT_OWM_BASE_URL.into()
}

fn default_timeout_secs() -> u64 {
    10
}

impl OpenWeatherMapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoilClassifierConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SoilClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(CropwiseError::Config(format!(
                "Config file not found at {:?}. Run `cropwise init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| CropwiseError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse YAML after substituting `${VAR}` placeholders from the environment.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| CropwiseError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.openweathermap.api_key.trim().is_empty() {
            return Err(CropwiseError::Config(
                "openweathermap.api_key is empty - set OPENWEATHER_API_KEY".into(),
            ));
        }
        if self.openweathermap.timeout_secs == 0 {
            return Err(CropwiseError::Config(
                "openweathermap.timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(ref classifier) = self.soil_classifier {
            if classifier.endpoint.trim().is_empty() {
                return Err(CropwiseError::Config(
                    "soil_classifier.endpoint is empty - remove the section to disable it".into(),
                ));
            }
            if classifier.timeout_secs == 0 {
                return Err(CropwiseError::Config(
                    "soil_classifier.timeout_secs must be at least 1".into(),
                ));
            }
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("cropwise").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/cropwise/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CropwiseError::Config("Cannot determine config directory".into()))?
            .join("cropwise");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up Cropwise!");
        println!();

        println!("Farm");
        let owner: String = Input::new()
            .with_prompt("  Owner name")
            .default(default_owner())
            .interact_text()
            .map_err(input_error)?;

        let location: String = Input::new()
            .with_prompt("  Default coordinates as `lat,lon` (blank to skip)")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)?;
        let (latitude, longitude) = parse_lat_lon(&location)?;

        println!();

        println!("OpenWeatherMap");
        let api_key: String = Password::new()
            .with_prompt("  API key (or ${OPENWEATHER_API_KEY})")
            .interact()
            .map_err(input_error)?;

        println!();

        println!("Soil classifier (leave endpoint blank to always use Loamy)");
        let endpoint: String = Input::new()
            .with_prompt("  Endpoint URL")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)?;

        println!();

        let config = Config {
            farm: FarmConfig {
                owner,
                latitude,
                longitude,
            },
            openweathermap: OpenWeatherMapConfig {
                api_key,
                base_url: default_owm_base_url(),
                timeout_secs: default_timeout_secs(),
            },
            soil_classifier: (!endpoint.is_empty()).then(|| SoilClassifierConfig {
                endpoint,
                timeout_secs: default_timeout_secs(),
            }),
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| CropwiseError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            concat!(
                "# Cropwise Configuration\n",
                "# Generated by `cropwise init`\n",
                "# Environment variable substitution (${{VAR}}) is supported.\n\n{}"
            ),
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("CROPWISE_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| CropwiseError::Config("Cannot determine data directory".into()))?
            .join("cropwise");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropwise.db"))
    }
}

fn input_error(e: dialoguer::Error) -> CropwiseError {
    CropwiseError::Config(format!("Input error: {}", e))
}

fn parse_lat_lon(s: &str) -> Result<(Option<f64>, Option<f64>)> {
    if s.trim().is_empty() {
        return Ok((None, None));
    }
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [lat, lon] => {
            let lat = lat
                .parse::<f64>()
                .map_err(|_| CropwiseError::Config(format!("invalid latitude '{}'", lat)))?;
            let lon = lon
                .parse::<f64>()
                .map_err(|_| CropwiseError::Config(format!("invalid longitude '{}'", lon)))?;
            Ok((Some(lat), Some(lon)))
        }
        _ => Err(CropwiseError::Config(format!(
            "expected `lat,lon`, got '{}'",
            s
        ))),
    }
}
