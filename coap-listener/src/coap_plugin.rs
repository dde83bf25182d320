/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::config::{ConfigError, ListenerSettings, PluginConfig};
use crate::control_plane::listener_lifecycle::{
    LifecycleError, ListenerLifecycle, ListenerState, DEFAULT_SHUTDOWN_GRACE_PERIOD,
};
use crate::data_plane::ingest_bridge::{IngestBridge, IngestSink};
use crate::observability::events;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

const COMPONENT: &str = "coap_plugin";

pub const PLUGIN_NAME: &str = "CoAP Plugin";
/// Version reported to the host; tracks the plugin contract, not the crate release.
pub const PLUGIN_VERSION: &str = "3.0.0";
pub const PLUGIN_MODE: &str = "async";
pub const PLUGIN_TYPE: &str = "south";
pub const PLUGIN_INTERFACE: &str = "1.0";

/// Static description of the plugin handed to the host by [`CoapPlugin::info`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub plugin_type: String,
    pub interface: String,
    pub config: PluginConfig,
}

/// Failures surfaced to the host by `start` and `reconfigure`.
#[derive(Debug)]
pub enum PluginError {
    Config(ConfigError),
    Lifecycle(LifecycleError),
}

impl Display for PluginError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginError::Config(err) => write!(f, "invalid plugin configuration: {err}"),
            PluginError::Lifecycle(err) => write!(f, "listener lifecycle failure: {err}"),
        }
    }
}

impl Error for PluginError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PluginError::Config(err) => Some(err),
            PluginError::Lifecycle(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PluginError {
    fn from(err: ConfigError) -> Self {
        PluginError::Config(err)
    }
}

impl From<LifecycleError> for PluginError {
    fn from(err: LifecycleError) -> Self {
        PluginError::Lifecycle(err)
    }
}

///
/// [`CoapPlugin`] is the synchronous control surface the host drives: it turns host
/// configuration into listener lifecycle actions.
///
/// Control calls return as soon as the listener is bound (`start`) or torn down
/// (`shutdown`); request handling happens on the listener's own thread.
///
/// # Examples
///
/// ```
/// use coap_listener::{CoapPlugin, ListenerState, PluginConfig, ReadingBatch};
/// use std::sync::Arc;
///
/// let plugin = CoapPlugin::new();
/// plugin.register_ingest(Arc::new(|batch: &ReadingBatch| {
///     println!("ingesting {:?}", batch.asset);
/// }));
///
/// let mut config = PluginConfig::with_default_values();
/// config.set_value("port", "0");
/// let config = plugin.init(config).unwrap();
///
/// plugin.start(config.clone()).unwrap();
/// assert_eq!(plugin.state(), ListenerState::Running);
///
/// plugin.shutdown(config);
/// assert_eq!(plugin.state(), ListenerState::Stopped);
/// ```
pub struct CoapPlugin {
    bridge: Arc<IngestBridge>,
    lifecycle: Mutex<ListenerLifecycle>,
    config: Mutex<Option<PluginConfig>>,
}

impl CoapPlugin {
    pub fn new() -> Self {
        Self::with_grace_period(DEFAULT_SHUTDOWN_GRACE_PERIOD)
    }

    /// Creates a plugin whose shutdown waits at most `grace_period` for the listener.
    pub fn with_grace_period(grace_period: Duration) -> Self {
        let bridge = Arc::new(IngestBridge::new());
        Self {
            lifecycle: Mutex::new(ListenerLifecycle::new(bridge.clone(), grace_period)),
            bridge,
            config: Mutex::new(None),
        }
    }

    pub fn info() -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: PLUGIN_VERSION.to_string(),
            mode: PLUGIN_MODE.to_string(),
            plugin_type: PLUGIN_TYPE.to_string(),
            interface: PLUGIN_INTERFACE.to_string(),
            config: PluginConfig::default_schema(),
        }
    }

    /// Validates `config`, keeps a private copy, and hands it back unchanged.
    pub fn init(&self, config: PluginConfig) -> Result<PluginConfig, ConfigError> {
        config.validate()?;
        *self.stored_config() = Some(config.clone());
        Ok(config)
    }

    /// Registers the ingestion sink; only the first registration takes effect.
    pub fn register_ingest(&self, sink: Arc<dyn IngestSink>) {
        // a rejected registration is logged by the bridge
        let _ = self.bridge.register(sink);
    }

    pub fn start(&self, config: PluginConfig) -> Result<(), PluginError> {
        let settings = config.listener_settings()?;
        let mut lifecycle = self.lifecycle();
        lifecycle.start(&settings)?;
        *self.stored_config() = Some(config);
        log_started(&settings);
        Ok(())
    }

    /// Stops the running listener, then starts one from `new_config`.
    ///
    /// The old listener is fully torn down before the new one binds, so both may use
    /// the same port. Returns `new_config` as the new handle.
    pub fn reconfigure(
        &self,
        old_config: PluginConfig,
        new_config: PluginConfig,
    ) -> Result<PluginConfig, PluginError> {
        info!(
            event = events::PLUGIN_RECONFIGURE,
            component = COMPONENT,
            "old config for listener {:?} \n new config {:?}",
            old_config,
            new_config
        );

        let mut lifecycle = self.lifecycle();
        info!(component = COMPONENT, "stopping listener...");

        let resolved = self
            .init(new_config)
            .and_then(|config| config.listener_settings().map(|settings| (config, settings)));
        let (new_config, settings) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                let _ = lifecycle.stop();
                return Err(err.into());
            }
        };

        lifecycle.restart(&settings)?;
        log_started(&settings);

        Ok(new_config)
    }

    /// Best-effort teardown; never fails towards the host.
    ///
    /// A listener that overruns the grace period is detached and reported once, at
    /// `warn`, by the lifecycle.
    pub fn shutdown(&self, _config: PluginConfig) {
        info!(component = COMPONENT, "stopping listener...");
        let _ = self.lifecycle().stop();
    }

    pub fn state(&self) -> ListenerState {
        self.lifecycle().state()
    }

    /// The bound address while the listener is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle().local_addr()
    }

    pub fn listener_settings(&self) -> Option<ListenerSettings> {
        self.lifecycle().settings().cloned()
    }

    pub fn has_listener_thread(&self) -> bool {
        self.lifecycle().has_listener_thread()
    }

    pub fn is_ingest_registered(&self) -> bool {
        self.bridge.is_registered()
    }

    /// The plugin's own copy of the last accepted configuration.
    pub fn config(&self) -> Option<PluginConfig> {
        self.stored_config().clone()
    }

    fn lifecycle(&self) -> MutexGuard<'_, ListenerLifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stored_config(&self) -> MutexGuard<'_, Option<PluginConfig>> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CoapPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn log_started(settings: &ListenerSettings) {
    info!(
        event = events::LISTENER_STARTED,
        component = COMPONENT,
        "listener started on port {} with uri {}",
        settings.port,
        settings.uri
    );
}

#[cfg(test)]
mod tests {
    use super::{CoapPlugin, PluginError};
    use crate::config::PluginConfig;
    use crate::control_plane::listener_lifecycle::{LifecycleError, ListenerState};

    fn ephemeral_config() -> PluginConfig {
        let mut config = PluginConfig::with_default_values();
        config.set_value("port", "0");
        config
    }

    #[test]
    fn info_reports_metadata_and_default_schema() {
        let info = CoapPlugin::info();

        assert_eq!(info.name, "CoAP Plugin");
        assert_eq!(info.version, "3.0.0");
        assert_eq!(info.mode, "async");
        assert_eq!(info.plugin_type, "south");
        assert_eq!(info.interface, "1.0");
        assert_eq!(info.config, PluginConfig::default_schema());
    }

    #[test]
    fn init_returns_config_unchanged_and_keeps_an_independent_copy() {
        let plugin = CoapPlugin::new();
        let mut config = ephemeral_config();

        let returned = plugin.init(config.clone()).expect("valid config");
        assert_eq!(returned, config);

        config.set_value("uri", "mutated-by-host");
        assert_eq!(
            plugin
                .config()
                .and_then(|stored| stored.get("uri").and_then(|item| item.value.clone())),
            Some("sensor-values".to_string())
        );
    }

    #[test]
    fn start_without_values_is_a_config_error() {
        let plugin = CoapPlugin::new();

        let err = plugin
            .start(PluginConfig::default_schema())
            .expect_err("values are required");

        assert!(matches!(err, PluginError::Config(_)));
        assert_eq!(plugin.state(), ListenerState::Stopped);
    }

    #[test]
    fn double_start_reports_already_running() {
        let plugin = CoapPlugin::new();
        plugin.start(ephemeral_config()).expect("first start");

        let err = plugin
            .start(ephemeral_config())
            .expect_err("second start must fail");

        assert!(matches!(
            err,
            PluginError::Lifecycle(LifecycleError::AlreadyRunning)
        ));
        assert_eq!(plugin.state(), ListenerState::Running);
        plugin.shutdown(ephemeral_config());
    }

    #[test]
    fn reconfigure_onto_the_same_port_returns_new_config() {
        let plugin = CoapPlugin::new();
        let old = plugin.init(ephemeral_config()).expect("valid config");
        plugin.start(old.clone()).expect("start");
        let port = plugin.local_addr().expect("bound address").port();

        let mut new = old.clone();
        new.set_value("port", &port.to_string());
        new.set_value("uri", "/readings/");
        let returned = plugin.reconfigure(old, new.clone()).expect("reconfigure");

        assert_eq!(returned, new);
        assert_eq!(plugin.state(), ListenerState::Running);
        assert_eq!(plugin.local_addr().map(|addr| addr.port()), Some(port));
        assert_eq!(
            plugin.listener_settings().map(|settings| settings.uri),
            Some("readings".to_string())
        );
        plugin.shutdown(returned);
    }

    #[test]
    fn reconfigure_with_invalid_config_leaves_listener_stopped() {
        let plugin = CoapPlugin::new();
        let old = ephemeral_config();
        plugin.start(old.clone()).expect("start");

        let mut new = old.clone();
        new.set_value("port", "not-a-port");
        let err = plugin.reconfigure(old, new).expect_err("port is invalid");

        assert!(matches!(err, PluginError::Config(_)));
        assert_eq!(plugin.state(), ListenerState::Stopped);
        assert!(!plugin.has_listener_thread());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let plugin = CoapPlugin::new();
        plugin.start(ephemeral_config()).expect("start");

        plugin.shutdown(ephemeral_config());
        plugin.shutdown(ephemeral_config());

        assert_eq!(plugin.state(), ListenerState::Stopped);
        assert!(!plugin.has_listener_thread());
    }
}
