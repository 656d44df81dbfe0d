//! Node configuration.
//!
//! Sources, highest precedence first:
//!
//! 1. command line flags, with `SENSORLINK_*` environment fallbacks
//! 2. broker settings saved in `mqtt.json`
//! 3. built-in defaults

use clap::Parser;
use sensorlink_core::constants::{
    DEFAULT_BROKER_HOST, DEFAULT_BROKER_PORT, DEFAULT_HEARTBEAT_INTERVAL_MS,
    DEFAULT_KEEP_ALIVE_SECS, DEFAULT_KEYPAD_TICK_MS, DEFAULT_TELEMETRY_INTERVAL_MS,
    RECONNECT_DELAY_MS, STARTUP_RECONNECT_ATTEMPTS,
};
use sensorlink_core::{DeviceId, Error, Result};
use sensorlink_network::{HeartbeatIdentity, MqttSettings, ReconnectPolicy};
use sensorlink_storage::BrokerSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Command line of the node binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "sensorlink-node")]
#[command(about = "Runtime-configurable sensor/actuator node bridged to MQTT")]
#[command(version)]
pub struct Args {
    /// Device id, root segment of every topic
    #[arg(long, env = "SENSORLINK_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Broker host
    #[arg(long, env = "SENSORLINK_BROKER")]
    pub broker: Option<String>,

    /// Broker port
    #[arg(long, env = "SENSORLINK_PORT")]
    pub port: Option<u16>,

    /// Save the resolved broker settings to mqtt.json
    #[arg(long)]
    pub save_broker: bool,

    /// Directory holding the configuration blobs
    #[arg(long, env = "SENSORLINK_STORAGE_DIR", default_value = "sensorlink-data")]
    pub storage_dir: PathBuf,

    /// MQTT keep-alive in seconds
    #[arg(long, env = "SENSORLINK_KEEP_ALIVE_SECS", default_value_t = DEFAULT_KEEP_ALIVE_SECS)]
    pub keep_alive_secs: u64,

    /// Bulk telemetry period in milliseconds
    #[arg(long, env = "SENSORLINK_TELEMETRY_INTERVAL_MS", default_value_t = DEFAULT_TELEMETRY_INTERVAL_MS)]
    pub telemetry_interval_ms: u64,

    /// Keypad scan period in milliseconds
    #[arg(long, env = "SENSORLINK_KEYPAD_TICK_MS", default_value_t = DEFAULT_KEYPAD_TICK_MS)]
    pub keypad_tick_ms: u64,

    /// Heartbeat period in milliseconds
    #[arg(long, env = "SENSORLINK_HEARTBEAT_INTERVAL_MS", default_value_t = DEFAULT_HEARTBEAT_INTERVAL_MS)]
    pub heartbeat_interval_ms: u64,

    /// Failed broker connections tolerated at startup
    #[arg(long, env = "SENSORLINK_RECONNECT_ATTEMPTS", default_value_t = STARTUP_RECONNECT_ATTEMPTS)]
    pub reconnect_attempts: u32,

    /// Pause between broker connection attempts in milliseconds
    #[arg(long, env = "SENSORLINK_RECONNECT_DELAY_MS", default_value_t = RECONNECT_DELAY_MS)]
    pub reconnect_delay_ms: u64,

    /// MAC address reported in heartbeats
    #[arg(long, env = "SENSORLINK_MAC", default_value = "00:00:00:00:00:00")]
    pub mac: String,

    /// IP address reported in heartbeats
    #[arg(long, env = "SENSORLINK_IP", default_value = "0.0.0.0")]
    pub ip: String,

    /// Run against the simulated board
    #[arg(long, env = "SENSORLINK_SIMULATE")]
    pub simulate: bool,

    /// Log filter (overrides RUST_LOG), e.g. "debug" or "sensorlink_registry=trace"
    #[arg(long, env = "SENSORLINK_LOG")]
    pub log_level: Option<String>,
}

/// Settings of a running node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub device_id: DeviceId,
    pub broker_host: String,
    pub broker_port: u16,
    pub keep_alive: Duration,
    pub storage_dir: PathBuf,
    pub telemetry_interval: Duration,
    pub keypad_tick: Duration,
    pub heartbeat_interval: Duration,
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub mac: String,
    pub ip: String,
    pub simulate: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: DeviceId::default(),
            broker_host: DEFAULT_BROKER_HOST.to_string(),
            broker_port: DEFAULT_BROKER_PORT,
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
            storage_dir: PathBuf::from("sensorlink-data"),
            telemetry_interval: Duration::from_millis(DEFAULT_TELEMETRY_INTERVAL_MS),
            keypad_tick: Duration::from_millis(DEFAULT_KEYPAD_TICK_MS),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            reconnect_attempts: STARTUP_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            mac: "00:00:00:00:00:00".to_string(),
            ip: "0.0.0.0".to_string(),
            simulate: false,
        }
    }
}

impl NodeConfig {
    /// Merge the command line over saved broker settings and defaults.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceId` for a bad device id and
    /// `Error::Config` for an empty broker host or a zero period.
    pub fn resolve(args: &Args, saved: Option<&BrokerSettings>) -> Result<Self> {
        let defaults = Self::default();

        let device_id = match (&args.device_id, saved) {
            (Some(id), _) => DeviceId::new(id.as_str())?,
            (None, Some(saved)) => saved.id.clone(),
            (None, None) => defaults.device_id,
        };
        let broker_host = args
            .broker
            .clone()
            .or_else(|| saved.map(|s| s.broker.clone()))
            .unwrap_or(defaults.broker_host);
        let broker_port = args
            .port
            .or_else(|| saved.map(|s| s.port))
            .unwrap_or(defaults.broker_port);

        let config = Self {
            device_id,
            broker_host,
            broker_port,
            keep_alive: Duration::from_secs(args.keep_alive_secs),
            storage_dir: args.storage_dir.clone(),
            telemetry_interval: Duration::from_millis(args.telemetry_interval_ms),
            keypad_tick: Duration::from_millis(args.keypad_tick_ms),
            heartbeat_interval: Duration::from_millis(args.heartbeat_interval_ms),
            reconnect_attempts: args.reconnect_attempts,
            reconnect_delay: Duration::from_millis(args.reconnect_delay_ms),
            mac: args.mac.clone(),
            ip: args.ip.clone(),
            simulate: args.simulate,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values the node cannot run with.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.broker_host.trim().is_empty() {
            return Err(Error::Config("broker host is empty".to_string()));
        }
        let periods = [
            ("telemetry interval", self.telemetry_interval),
            ("keypad tick", self.keypad_tick),
            ("heartbeat interval", self.heartbeat_interval),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, period)| period.is_zero()) {
            return Err(Error::Config(format!("{name} must be positive")));
        }
        if self.reconnect_attempts == 0 {
            return Err(Error::Config("reconnect attempts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn broker(mut self, host: impl Into<String>, port: u16) -> Self {
        self.broker_host = host.into();
        self.broker_port = port;
        self
    }

    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn telemetry_interval(mut self, interval: Duration) -> Self {
        self.telemetry_interval = interval;
        self
    }

    pub fn keypad_tick(mut self, tick: Duration) -> Self {
        self.keypad_tick = tick;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Settings to save in `mqtt.json`.
    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings::new(&self.broker_host, self.broker_port, self.device_id.clone())
    }

    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings::new(&self.broker_host, self.broker_port, self.device_id.as_str())
            .with_keep_alive(self.keep_alive)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            startup_attempts: self.reconnect_attempts,
            delay: self.reconnect_delay,
        }
    }

    pub fn heartbeat_identity(&self) -> HeartbeatIdentity {
        HeartbeatIdentity::new(&self.mac, &self.ip)
    }
}
