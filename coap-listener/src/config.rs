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

//! Host configuration document and the listener settings resolved from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const PLUGIN_OPTION: &str = "plugin";
pub const PORT_OPTION: &str = "port";
pub const URI_OPTION: &str = "uri";

pub const PLUGIN_IDENTIFIER: &str = "coap";
pub const DEFAULT_PORT: u16 = 5683;
pub const DEFAULT_URI: &str = "sensor-values";

/// One option of the host configuration document.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConfigItem {
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Host attributes the listener does not interpret, kept for round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConfigItem {
    pub fn new(description: &str, item_type: &str, default: &str) -> Self {
        Self {
            description: description.to_string(),
            item_type: item_type.to_string(),
            default: default.to_string(),
            value: None,
            extra: BTreeMap::new(),
        }
    }
}

///
/// [`PluginConfig`] is the host's option-name to [`ConfigItem`] mapping.
///
/// The host owns it and passes it by value on every control call.
///
/// # Examples
///
/// ```
/// use coap_listener::PluginConfig;
///
/// let mut config = PluginConfig::default_schema();
/// config.set_value("port", "1234");
/// config.set_value("uri", "sensor-values");
///
/// let settings = config.listener_settings().unwrap();
/// assert_eq!(settings.port, 1234);
/// assert_eq!(settings.uri, "sensor-values");
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct PluginConfig {
    options: BTreeMap<String, ConfigItem>,
}

impl PluginConfig {
    /// The recognized options with their defaults and no values set.
    pub fn default_schema() -> Self {
        let mut options = BTreeMap::new();
        options.insert(
            PLUGIN_OPTION.to_string(),
            ConfigItem::new("Name of the plugin to load", "string", PLUGIN_IDENTIFIER),
        );
        options.insert(
            PORT_OPTION.to_string(),
            ConfigItem::new("Port to listen on", "integer", &DEFAULT_PORT.to_string()),
        );
        options.insert(
            URI_OPTION.to_string(),
            ConfigItem::new("URI to accept data on", "string", DEFAULT_URI),
        );
        Self { options }
    }

    /// The default schema with every `value` populated from its `default`.
    pub fn with_default_values() -> Self {
        let mut config = Self::default_schema();
        for item in config.options.values_mut() {
            item.value = Some(item.default.clone());
        }
        config
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|err| ConfigError::Malformed(err.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::Malformed(err.to_string()))
    }

    pub fn get(&self, option: &str) -> Option<&ConfigItem> {
        self.options.get(option)
    }

    pub fn insert(&mut self, option: &str, item: ConfigItem) -> Option<ConfigItem> {
        self.options.insert(option.to_string(), item)
    }

    /// Sets `value` on an existing option; returns `false` when the option is unknown.
    pub fn set_value(&mut self, option: &str, value: &str) -> bool {
        match self.options.get_mut(option) {
            Some(item) => {
                item.value = Some(value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn value(&self, option: &str) -> Result<&str, ConfigError> {
        let item = self
            .options
            .get(option)
            .ok_or_else(|| ConfigError::MissingOption(option.to_string()))?;
        item.value
            .as_deref()
            .ok_or_else(|| ConfigError::MissingValue(option.to_string()))
    }

    /// Checks that every recognized option is present and the plugin identifier matches.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for option in [PLUGIN_OPTION, PORT_OPTION, URI_OPTION] {
            if !self.options.contains_key(option) {
                return Err(ConfigError::MissingOption(option.to_string()));
            }
        }

        if let Some(plugin) = self.options.get(PLUGIN_OPTION) {
            let identifier = plugin.value.as_deref().unwrap_or(&plugin.default);
            if identifier != PLUGIN_IDENTIFIER {
                return Err(ConfigError::UnexpectedPlugin(identifier.to_string()));
            }
        }

        Ok(())
    }

    /// Resolves the listener port and resource path from the populated values.
    pub fn listener_settings(&self) -> Result<ListenerSettings, ConfigError> {
        let port_text = self.value(PORT_OPTION)?;
        let port = port_text
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port_text.to_string()))?;

        let uri = self.value(URI_OPTION)?.trim().trim_matches('/');
        if uri.is_empty() {
            return Err(ConfigError::InvalidUri(uri.to_string()));
        }

        Ok(ListenerSettings {
            port,
            uri: uri.to_string(),
        })
    }
}

/// Where the listener binds and which resource path it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    pub port: u16,
    pub uri: String,
}

impl ListenerSettings {
    pub fn new(port: u16, uri: &str) -> Self {
        Self {
            port,
            uri: uri.trim_matches('/').to_string(),
        }
    }
}

/// Failures while reading the host configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Malformed(String),
    MissingOption(String),
    MissingValue(String),
    InvalidPort(String),
    InvalidUri(String),
    UnexpectedPlugin(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Malformed(detail) => write!(f, "malformed configuration: {detail}"),
            ConfigError::MissingOption(option) => write!(f, "missing option `{option}`"),
            ConfigError::MissingValue(option) => write!(f, "option `{option}` has no value"),
            ConfigError::InvalidPort(port) => write!(f, "invalid port `{port}`"),
            ConfigError::InvalidUri(uri) => write!(f, "invalid resource path `{uri}`"),
            ConfigError::UnexpectedPlugin(plugin) => {
                write!(f, "configuration is for plugin `{plugin}`, not `{PLUGIN_IDENTIFIER}`")
            }
        }
    }
}

impl Error for ConfigError {}
