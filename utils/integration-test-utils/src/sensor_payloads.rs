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

use coap_listener::PluginConfig;
use serde_json::{json, Value};

pub fn encode_document(document: &Value) -> Vec<u8> {
    let mut body = Vec::new();
    ciborium::ser::into_writer(document, &mut body).expect("document should encode as CBOR");
    body
}

pub fn sensor_document() -> Value {
    json!({
        "timestamp": "2017-01-02T01:02:03.23232Z-05:00",
        "asset": "sensor1",
        "key": "80a43623-ebe5-40d6-8d80-3f892da9b3b4",
        "readings": {
            "velocity": "500",
            "temperature": {"value": "32", "unit": "kelvin"}
        }
    })
}

/// Readings carried under the `sensor_values` field instead of `readings`.
pub fn sensor_values_document() -> Value {
    json!({
        "asset": "sensor2",
        "sensor_values": {"humidity": 41}
    })
}

pub fn scalar_readings_document() -> Value {
    json!({
        "asset": "sensor1",
        "readings": 42
    })
}

/// Default values with the port set to 0 so every listener gets its own ephemeral port.
pub fn ephemeral_config() -> PluginConfig {
    let mut config = PluginConfig::with_default_values();
    config.set_value("port", "0");
    config
}
