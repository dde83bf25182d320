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

use serde::Serialize;
use serde_json::{Map, Value};

/// Sensor-name to reading-value mapping carried by a [`ReadingBatch`].
///
/// A reading value is either a scalar or a nested mapping such as
/// `{"value": "32", "unit": "kelvin"}`; values are passed through uninterpreted.
/// CBOR-only values arrive in their JSON rendering: byte strings as hex text and
/// non-text sensor keys as their text form.
pub type Readings = Map<String, Value>;

///
/// [`ReadingBatch`] is one decoded ingestion unit, as handed to the
/// [`IngestSink`][crate::IngestSink].
///
/// `asset`, `timestamp` and `key` are optional because partial documents are
/// tolerated; `timestamp` is caller-supplied and is not validated, `key` is used by
/// the sink for idempotent ingestion.
///
/// # Examples
///
/// ```
/// use coap_listener::ReadingBatch;
/// use serde_json::json;
///
/// let readings = json!({"velocity": "500"}).as_object().cloned().unwrap();
/// let batch = ReadingBatch::new(Some("sensor1"), None, None, readings);
///
/// assert_eq!(batch.asset.as_deref(), Some("sensor1"));
/// assert_eq!(batch.readings.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReadingBatch {
    pub asset: Option<String>,
    pub timestamp: Option<String>,
    pub key: Option<String>,
    pub readings: Readings,
}

impl ReadingBatch {
    pub fn new(
        asset: Option<&str>,
        timestamp: Option<&str>,
        key: Option<&str>,
        readings: Readings,
    ) -> Self {
        Self {
            asset: asset.map(str::to_string),
            timestamp: timestamp.map(str::to_string),
            key: key.map(str::to_string),
            readings,
        }
    }
}
