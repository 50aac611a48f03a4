//! Configuration file support for bufmond
//!
//! Loads and validates bufmond configuration from TOML files.
//! Default location: /etc/sonic/bufmond.toml

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sonic_bst::HwUnit;

use crate::counter::CounterInfo;
use crate::error::{BufmonError, BufmonResult};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/bufmond.toml";

/// What the occupancy counters report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountersMode {
    /// Instantaneous occupancy
    #[default]
    Current,
    /// Peak occupancy since the last clear
    Peak,
}

impl CountersMode {
    /// Value of the tracking-mode control register
    pub fn as_control_value(self) -> i32 {
        match self {
            CountersMode::Current => 0,
            CountersMode::Peak => 1,
        }
    }
}

/// Device-wide bufmon settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Buffer statistics tracking enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Current or peak occupancy
    #[serde(default)]
    pub counters_mode: CountersMode,

    /// Poll counters on a fixed period
    #[serde(default = "default_periodic_collection")]
    pub periodic_collection_enabled: bool,

    /// Polling period in seconds
    #[serde(default = "default_collection_period")]
    pub collection_period_secs: u64,

    /// Poll counters when a threshold trigger fires
    #[serde(default = "default_trigger_collection")]
    pub threshold_trigger_collection_enabled: bool,

    /// Minimum delay between a trigger poll and re-arming, in seconds
    #[serde(default = "default_trigger_rate_limit")]
    pub trigger_rate_limit_secs: u64,
}

/// Simulated ASIC settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Front-panel ports per unit (port 0 is the CPU port)
    #[serde(default = "default_ports_per_unit")]
    pub ports_per_unit: i32,
}

/// One monitored counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Counter name, e.g. "egress-uc-queue/uc-buffer-count"
    pub name: String,

    /// Hardware unit
    #[serde(default)]
    pub hw_unit: u32,

    /// Trigger threshold in bytes, 0 leaves the hardware threshold untouched
    #[serde(default)]
    pub trigger_threshold: u64,

    /// Addressing parameters (port, queue, priority-group, service-pool)
    #[serde(default)]
    pub params: BTreeMap<String, i64>,
}

impl CounterConfig {
    /// Builds the request passed to the dispatcher
    pub fn to_counter_info(&self) -> CounterInfo {
        let mut info = CounterInfo::new(HwUnit::new(self.hw_unit), self.name.clone())
            .with_threshold(self.trigger_threshold);
        for (key, value) in &self.params {
            info.params.insert(key.clone(), value);
        }
        info
    }
}

/// Complete bufmond configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufmonConfig {
    /// Number of hardware units, managed as units 0..hw_units
    #[serde(default = "default_hw_units")]
    pub hw_units: u32,

    /// Depth of the driver event hand-off channel
    #[serde(default = "default_trigger_channel_capacity")]
    pub trigger_channel_capacity: usize,

    /// System settings
    #[serde(default)]
    pub system: SystemConfig,

    /// Simulation settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Monitored counters
    #[serde(default)]
    pub counters: Vec<CounterConfig>,
}

// Default functions
fn default_enabled() -> bool {
    true
}

fn default_periodic_collection() -> bool {
    true
}

fn default_collection_period() -> u64 {
    10
}

fn default_trigger_collection() -> bool {
    true
}

fn default_trigger_rate_limit() -> u64 {
    1
}

fn default_ports_per_unit() -> i32 {
    32
}

fn default_hw_units() -> u32 {
    1
}

fn default_trigger_channel_capacity() -> usize {
    64
}

// Default implementations
impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            counters_mode: CountersMode::default(),
            periodic_collection_enabled: default_periodic_collection(),
            collection_period_secs: default_collection_period(),
            threshold_trigger_collection_enabled: default_trigger_collection(),
            trigger_rate_limit_secs: default_trigger_rate_limit(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ports_per_unit: default_ports_per_unit(),
        }
    }
}

impl Default for BufmonConfig {
    fn default() -> Self {
        Self {
            hw_units: default_hw_units(),
            trigger_channel_capacity: default_trigger_channel_capacity(),
            system: SystemConfig::default(),
            simulation: SimulationConfig::default(),
            counters: Vec::new(),
        }
    }
}

impl SystemConfig {
    /// Get collection period as Duration
    pub fn collection_period(&self) -> Duration {
        Duration::from_secs(self.collection_period_secs)
    }

    /// Get trigger rate limit as Duration
    pub fn trigger_rate_limit(&self) -> Duration {
        Duration::from_secs(self.trigger_rate_limit_secs)
    }

    /// Whether hardware triggers should be armed
    pub fn triggers_wanted(&self) -> bool {
        self.enabled && self.threshold_trigger_collection_enabled
    }
}

impl BufmonConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> BufmonResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map_err(|e| {
                BufmonError::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(BufmonError::Io(e)),
        }
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> BufmonResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            BufmonError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Managed hardware units
    pub fn units(&self) -> Vec<HwUnit> {
        (0..self.hw_units).map(HwUnit::new).collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> BufmonResult<()> {
        if self.hw_units == 0 {
            return Err(BufmonError::Configuration(
                "hw_units must be > 0".to_string(),
            ));
        }

        if self.trigger_channel_capacity == 0 {
            return Err(BufmonError::Configuration(
                "trigger_channel_capacity must be > 0".to_string(),
            ));
        }

        if self.system.periodic_collection_enabled && self.system.collection_period_secs == 0 {
            return Err(BufmonError::Configuration(
                "collection_period_secs must be > 0".to_string(),
            ));
        }

        if self.simulation.ports_per_unit < 0 {
            return Err(BufmonError::Configuration(
                "ports_per_unit must be >= 0".to_string(),
            ));
        }

        for counter in &self.counters {
            if counter.hw_unit >= self.hw_units {
                return Err(BufmonError::Configuration(format!(
                    "counter '{}' addresses hw_unit {} but only {} unit(s) are managed",
                    counter.name, counter.hw_unit, self.hw_units
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::params;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BufmonConfig::default();
        assert_eq!(config.hw_units, 1);
        assert_eq!(config.trigger_channel_capacity, 64);
        assert!(config.system.enabled);
        assert_eq!(config.system.counters_mode, CountersMode::Current);
        assert!(config.counters.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let system = SystemConfig::default();
        assert_eq!(system.collection_period(), Duration::from_secs(10));
        assert_eq!(system.trigger_rate_limit(), Duration::from_secs(1));
    }

    #[test]
    fn test_counters_mode_control_value() {
        assert_eq!(CountersMode::Current.as_control_value(), 0);
        assert_eq!(CountersMode::Peak.as_control_value(), 1);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
hw_units = 2

[system]
counters_mode = "peak"
trigger_rate_limit_secs = 5

[[counters]]
name = "egress-uc-queue/uc-buffer-count"
hw_unit = 1
trigger_threshold = 4096
params = { queue = 13 }

[[counters]]
name = "device/data"
"#;
        let config = BufmonConfig::parse(toml_str).unwrap();
        assert_eq!(config.hw_units, 2);
        assert_eq!(config.system.counters_mode, CountersMode::Peak);
        assert_eq!(config.system.trigger_rate_limit_secs, 5);
        // Unspecified values should use defaults
        assert_eq!(config.system.collection_period_secs, 10);
        assert_eq!(config.counters.len(), 2);
        assert_eq!(config.counters[1].hw_unit, 0);
        assert_eq!(config.counters[1].trigger_threshold, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_counter_to_info() {
        let counter = CounterConfig {
            name: "ingress-port-service-pool/um-share-buffer-count".to_string(),
            hw_unit: 0,
            trigger_threshold: 512,
            params: BTreeMap::from([
                (params::PORT.to_string(), 4),
                (params::SERVICE_POOL.to_string(), 2),
            ]),
        };
        let info = counter.to_counter_info();
        assert_eq!(info.display_name(), counter.name);
        assert_eq!(info.trigger_threshold, 512);
        assert_eq!(info.params.get_int(params::PORT), Some(4));
        assert_eq!(info.params.get_int(params::SERVICE_POOL), Some(2));
        assert_eq!(info.value, 0);
    }

    #[test]
    fn test_validate_rejects_zero_units() {
        let config = BufmonConfig {
            hw_units: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = BufmonConfig {
            trigger_channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let mut config = BufmonConfig::default();
        config.system.collection_period_secs = 0;
        assert!(config.validate().is_err());

        config.system.periodic_collection_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unmanaged_unit() {
        let mut config = BufmonConfig::default();
        config.counters.push(CounterConfig {
            name: "device/data".to_string(),
            hw_unit: 3,
            trigger_threshold: 0,
            params: BTreeMap::new(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hw_unit 3"));
    }

    #[test]
    fn test_units() {
        let config = BufmonConfig {
            hw_units: 3,
            ..Default::default()
        };
        assert_eq!(
            config.units(),
            vec![HwUnit::new(0), HwUnit::new(1), HwUnit::new(2)]
        );
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = BufmonConfig::load_or_default("/nonexistent/bufmond.toml").unwrap();
        assert_eq!(config, BufmonConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hw_units = 4").unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "ports_per_unit = 16").unwrap();

        let config = BufmonConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.hw_units, 4);
        assert_eq!(config.simulation.ports_per_unit, 16);
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hw_units = \"many\"").unwrap();

        let err = BufmonConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, BufmonError::Configuration(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bufmond.toml");
        let mut config = BufmonConfig::default();
        config.system.counters_mode = CountersMode::Peak;
        config.counters.push(CounterConfig {
            name: "egress-cpu-queue/cpu-buffer-count".to_string(),
            hw_unit: 0,
            trigger_threshold: 1024,
            params: BTreeMap::from([(params::QUEUE.to_string(), 1)]),
        });

        config.save(&path).unwrap();
        let loaded = BufmonConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
