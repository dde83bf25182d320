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

mod coap_test_client;
pub use coap_test_client::{post, post_request_bytes, send_raw, CoapTestClient, CLIENT_TIMEOUT};

mod log_capture;
pub use log_capture::{init_logging, CapturedEvent, LogCapture};

mod recording_sink;
pub use recording_sink::RecordingSink;

mod sensor_payloads;
pub use sensor_payloads::{
    encode_document, ephemeral_config, scalar_readings_document, sensor_document,
    sensor_values_document,
};
