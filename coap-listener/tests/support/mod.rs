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

use coap_listener::{CoapPlugin, ListenerState, PluginConfig};
use coap_lite::{MessageClass, Packet, ResponseType};
use integration_test_utils::{ephemeral_config, RecordingSink};
use std::sync::Arc;

/// A running plugin on an ephemeral port with a recording sink registered.
#[allow(dead_code)]
pub(crate) struct RunningPlugin {
    pub(crate) plugin: CoapPlugin,
    pub(crate) config: PluginConfig,
    pub(crate) sink: RecordingSink,
    pub(crate) port: u16,
}

impl RunningPlugin {
    #[allow(dead_code)]
    pub(crate) fn shutdown(self) {
        self.plugin.shutdown(self.config);
        assert_eq!(self.plugin.state(), ListenerState::Stopped);
    }
}

#[allow(dead_code)]
pub(crate) fn start_with_sink() -> RunningPlugin {
    let plugin = CoapPlugin::new();
    let sink = RecordingSink::new();
    plugin.register_ingest(Arc::new(sink.clone()));
    let (config, port) = start_plugin(&plugin);

    RunningPlugin {
        plugin,
        config,
        sink,
        port,
    }
}

#[allow(dead_code)]
pub(crate) fn start_plugin(plugin: &CoapPlugin) -> (PluginConfig, u16) {
    let config = plugin
        .init(ephemeral_config())
        .expect("default config should validate");
    plugin
        .start(config.clone())
        .expect("listener should start on an ephemeral port");
    let port = plugin
        .local_addr()
        .expect("running listener has an address")
        .port();
    (config, port)
}

pub(crate) fn assert_response(packet: &Packet, expected: ResponseType) {
    assert_eq!(packet.header.code, MessageClass::Response(expected));
    assert!(packet.payload.is_empty(), "responses carry no payload");
}
