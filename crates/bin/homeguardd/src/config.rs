//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `homeguard.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use homeguard_adapter_mqtt::MqttConfig;
use homeguard_app::reconciler::ReconcilerConfig;
use homeguard_domain::config::HomeConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// PIN and alarm timings.
    pub security: SecurityConfig,
    /// Motion and distance tuning.
    pub occupancy: OccupancyConfig,
    /// Kitchen timer settings.
    pub timer: TimerConfig,
    /// Reconciliation loop settings.
    pub sync: SyncConfig,
    /// MQTT bridge settings.
    pub mqtt: MqttConfig,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Four-digit keypad secret.
    pub pin: String,
    pub arm_delay_secs: f64,
    pub entry_delay_secs: f64,
    pub door_timeout_secs: f64,
    pub tilt_threshold: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    pub motion_debounce_secs: f64,
    pub direction_threshold_cm: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Seconds added by one push-button press.
    pub add_step_secs: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Device id stamped on actuator records.
    pub device_id: String,
    pub tick_millis: u64,
    pub display_rotation_secs: f64,
    pub light_pulse_secs: f64,
    /// Upper bound on one actuator send before it is abandoned.
    pub send_timeout_secs: f64,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Drive simulated actuators when the MQTT bridge is disabled.
    pub virtual_enabled: bool,
}

impl Config {
    /// Load configuration from `homeguard.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homeguard.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("HOMEGUARD_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("HOMEGUARD_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("HOMEGUARD_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("HOMEGUARD_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("HOMEGUARD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("HOMEGUARD_PIN") {
            self.security.pin = val;
        }
        if let Some(val) = var("HOMEGUARD_MQTT_HOST") {
            self.mqtt.broker_host = val;
            self.mqtt.enabled = true;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.home_config()
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        let durations = [
            ("security.arm_delay_secs", self.security.arm_delay_secs),
            ("security.entry_delay_secs", self.security.entry_delay_secs),
            ("security.door_timeout_secs", self.security.door_timeout_secs),
            (
                "occupancy.motion_debounce_secs",
                self.occupancy.motion_debounce_secs,
            ),
            (
                "sync.display_rotation_secs",
                self.sync.display_rotation_secs,
            ),
            ("sync.light_pulse_secs", self.sync.light_pulse_secs),
            ("sync.send_timeout_secs", self.sync.send_timeout_secs),
        ];
        if let Some((name, _)) = durations
            .iter()
            .find(|(_, secs)| !(secs.is_finite() && *secs > 0.0))
        {
            return Err(ConfigError::Validation(format!("{name} must be positive")));
        }
        if self.sync.tick_millis == 0 {
            return Err(ConfigError::Validation(
                "sync.tick_millis must be non-zero".to_string(),
            ));
        }
        if self.mqtt.enabled && self.mqtt.client_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "mqtt.client_id must not be empty".to_string(),
            ));
        }
        if !self.mqtt.enabled && !self.integrations.virtual_enabled {
            return Err(ConfigError::Validation(
                "enable either mqtt or integrations.virtual_enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Settings of the home state machine.
    #[must_use]
    pub fn home_config(&self) -> HomeConfig {
        HomeConfig {
            pin: self.security.pin.clone(),
            arm_delay_secs: self.security.arm_delay_secs,
            entry_delay_secs: self.security.entry_delay_secs,
            door_timeout_secs: self.security.door_timeout_secs,
            tilt_threshold: self.security.tilt_threshold,
            motion_debounce_secs: self.occupancy.motion_debounce_secs,
            direction_threshold_cm: self.occupancy.direction_threshold_cm,
            timer_step_secs: self.timer.add_step_secs,
        }
    }

    /// Settings of the reconciliation loop. Call after validation.
    #[must_use]
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            device_id: self.sync.device_id.clone(),
            tick: Duration::from_millis(self.sync.tick_millis),
            display_rotation: Duration::try_from_secs_f64(self.sync.display_rotation_secs)
                .unwrap_or_default(),
            light_pulse: Duration::try_from_secs_f64(self.sync.light_pulse_secs)
                .unwrap_or_default(),
            send_timeout: Duration::try_from_secs_f64(self.sync.send_timeout_secs)
                .unwrap_or_default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:homeguard.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homeguardd=info,homeguard=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let home = HomeConfig::default();
        Self {
            pin: home.pin,
            arm_delay_secs: home.arm_delay_secs,
            entry_delay_secs: home.entry_delay_secs,
            door_timeout_secs: home.door_timeout_secs,
            tilt_threshold: home.tilt_threshold,
        }
    }
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        let home = HomeConfig::default();
        Self {
            motion_debounce_secs: home.motion_debounce_secs,
            direction_threshold_cm: home.direction_threshold_cm,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            add_step_secs: HomeConfig::default().timer_step_secs,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let sync = ReconcilerConfig::default();
        Self {
            device_id: sync.device_id,
            tick_millis: 250,
            display_rotation_secs: sync.display_rotation.as_secs_f64(),
            light_pulse_secs: sync.light_pulse.as_secs_f64(),
            send_timeout_secs: sync.send_timeout.as_secs_f64(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
