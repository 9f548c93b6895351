use once_cell::sync::Lazy;
use serde::Deserialize;
use std::time::Duration;
use std::{env, fs, path::Path};

use crate::core::queue::{BoundedStorage, FixedQueue, MonitoredQueue};
use crate::core::throttle::ThrottledAction;

/// Environment variable naming the config file; overrides CLI paths.
pub const CONFIG_ENV: &str = "FLOODGATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "floodgate.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
    pub capacity: usize,
    pub low_watermark: usize,
    pub high_watermark: usize,
    pub high_watermark2: usize,
    pub timed_operations: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "queue".to_string(),
            capacity: 250_000,
            low_watermark: 50_000,
            high_watermark: 150_000,
            high_watermark2: 200_000,
            timed_operations: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ThrottleConfig {
    pub interval_ms: u64,
    pub max_per_interval: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            max_per_interval: 1,
        }
    }
}

impl ThrottleConfig {
    pub fn build(&self) -> ThrottledAction {
        ThrottledAction::new(Duration::from_millis(self.interval_ms), self.max_per_interval)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BenchConfig {
    pub pushers: usize,
    pub iterations: usize,
    pub busy_work: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            pushers: 5,
            iterations: 1_000_000,
            busy_work: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub queue: QueueConfig,
    pub throttle: ThrottleConfig,
    pub bench: BenchConfig,
}

impl Config {
    /// Builds a queue over [`FixedQueue`] storage from `[queue]` and `[throttle]`.
    pub fn build_queue<T: Send>(&self) -> anyhow::Result<MonitoredQueue<T>> {
        let storage = FixedQueue::new(self.queue.capacity);
        self.configure(MonitoredQueue::with_storage(storage, self.queue.timed_operations))
    }

    /// Names, throttles and sets the watermarks of an existing queue.
    pub fn configure<T, S: BoundedStorage<T>>(
        &self,
        queue: MonitoredQueue<T, S>,
    ) -> anyhow::Result<MonitoredQueue<T, S>> {
        let queue = queue
            .named(self.queue.name.clone())
            .with_warning_throttle(self.throttle.build());
        queue.set_watermarks(
            self.queue.low_watermark,
            self.queue.high_watermark,
            self.queue.high_watermark2,
        )?;
        Ok(queue)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}

/// Loads from `$FLOODGATE_CONFIG`, falling back to `path`.
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    match env::var(CONFIG_ENV) {
        Ok(p) => load_config(p),
        Err(_) => load_config(path),
    }
}

/// Process-wide configuration, read once from `$FLOODGATE_CONFIG` or
/// `floodgate.toml`. Defaults apply when neither can be read.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match load_config_with_env(DEFAULT_CONFIG_PATH) {
    Ok(cfg) => cfg,
    Err(e) => {
        tracing::debug!(target: "floodgate::config", error = %e, "Using default configuration");
        Config::default()
    }
});
