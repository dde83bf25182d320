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

//! Process-wide host entry points.
//!
//! The host loads one listener per process and drives it through these free
//! functions, which all delegate to a single lazily created [`CoapPlugin`].

use crate::coap_plugin::{CoapPlugin, PluginError, PluginInfo};
use crate::config::{ConfigError, PluginConfig};
use crate::data_plane::ingest_bridge::IngestSink;
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref PLUGIN: CoapPlugin = CoapPlugin::new();
}

/// The process-wide plugin instance.
pub fn instance() -> &'static CoapPlugin {
    &PLUGIN
}

pub fn info() -> PluginInfo {
    CoapPlugin::info()
}

pub fn init(config: PluginConfig) -> Result<PluginConfig, ConfigError> {
    PLUGIN.init(config)
}

pub fn start(config: PluginConfig) -> Result<(), PluginError> {
    PLUGIN.start(config)
}

pub fn reconfigure(
    old_config: PluginConfig,
    new_config: PluginConfig,
) -> Result<PluginConfig, PluginError> {
    PLUGIN.reconfigure(old_config, new_config)
}

pub fn shutdown(config: PluginConfig) {
    PLUGIN.shutdown(config)
}

pub fn register_ingest(sink: Arc<dyn IngestSink>) {
    PLUGIN.register_ingest(sink)
}
