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

mod support;

use coap_listener::{plugin, ListenerState, PluginConfig};
use coap_lite::{MessageType, ResponseType};
use integration_test_utils::{
    encode_document, ephemeral_config, post, sensor_document, RecordingSink,
};
use std::sync::Arc;

// The process-wide instance is shared, so the whole host sequence lives in one test.
#[test]
fn host_drives_the_process_wide_plugin() {
    integration_test_utils::init_logging();

    let info = plugin::info();
    assert_eq!(info.name, "CoAP Plugin");
    assert_eq!(info.config, PluginConfig::default_schema());
    let described = serde_json::to_value(&info).expect("info should serialize");
    assert_eq!(described["type"], "south");
    assert_eq!(described["version"], "3.0.0");
    assert_eq!(described["config"]["port"]["default"], "5683");

    let sink = RecordingSink::new();
    plugin::register_ingest(Arc::new(sink.clone()));
    let ignored = RecordingSink::new();
    plugin::register_ingest(Arc::new(ignored.clone()));

    let config = plugin::init(ephemeral_config()).expect("config should validate");
    plugin::start(config.clone()).expect("listener should start");
    let port = plugin::instance()
        .local_addr()
        .expect("running listener has an address")
        .port();

    let body = encode_document(&sensor_document());
    let response = post(port, "sensor-values", &body, MessageType::Confirmable)
        .expect("POST should be answered");
    support::assert_response(&response, ResponseType::Valid);
    assert_eq!(sink.count(), 1);
    assert_eq!(ignored.count(), 0);

    let mut new_config = config.clone();
    new_config.set_value("uri", "readings");
    let config = plugin::reconfigure(config, new_config).expect("reconfigure");
    let port = plugin::instance()
        .local_addr()
        .expect("reconfigured listener has an address")
        .port();
    let response = post(port, "readings", &body, MessageType::Confirmable)
        .expect("POST should be answered");
    support::assert_response(&response, ResponseType::Valid);
    assert_eq!(sink.count(), 2);

    plugin::shutdown(config.clone());
    plugin::shutdown(config);
    assert_eq!(plugin::instance().state(), ListenerState::Stopped);
}
