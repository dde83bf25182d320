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

//! Canonical structured event names used across `coap-listener`.

// Datagram dispatch events.
pub const DATAGRAM_RECEIVE: &str = "datagram_receive";
pub const DATAGRAM_DROP_MALFORMED: &str = "datagram_drop_malformed";
pub const DATAGRAM_DROP_NOT_A_REQUEST: &str = "datagram_drop_not_a_request";
pub const DATAGRAM_RECV_FAILED: &str = "datagram_recv_failed";
pub const RESPONSE_SEND_OK: &str = "response_send_ok";
pub const RESPONSE_SEND_FAILED: &str = "response_send_failed";
pub const RESPONSE_ENCODE_FAILED: &str = "response_encode_failed";
pub const REQUEST_PATH_NOT_FOUND: &str = "request_path_not_found";
pub const REQUEST_METHOD_NOT_ALLOWED: &str = "request_method_not_allowed";
pub const REQUEST_DUPLICATE_REPLAYED: &str = "request_duplicate_replayed";
pub const REQUEST_DUPLICATE_DROPPED: &str = "request_duplicate_dropped";

// Request handling events.
pub const REQUEST_DECODE_FAILED: &str = "request_decode_failed";
pub const REQUEST_FORMAT_REJECTED: &str = "request_format_rejected";
pub const REQUEST_INGEST_FAILED: &str = "request_ingest_failed";
pub const REQUEST_INGEST_OK: &str = "request_ingest_ok";

// Ingest bridge events.
pub const INGEST_SINK_REGISTERED: &str = "ingest_sink_registered";
pub const INGEST_SINK_REGISTER_REJECTED: &str = "ingest_sink_register_rejected";
pub const INGEST_SINK_PANICKED: &str = "ingest_sink_panicked";

// Listener lifecycle events.
pub const LISTENER_START_REQUESTED: &str = "listener_start_requested";
pub const LISTENER_STARTED: &str = "listener_started";
pub const LISTENER_START_FAILED: &str = "listener_start_failed";
pub const LISTENER_STOP_REQUESTED: &str = "listener_stop_requested";
pub const LISTENER_STOPPED: &str = "listener_stopped";
pub const LISTENER_STOP_NOOP: &str = "listener_stop_noop";
pub const LISTENER_STOP_TIMEOUT: &str = "listener_stop_timeout";
pub const LISTENER_THREAD_PANICKED: &str = "listener_thread_panicked";

// Runtime thread events.
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";
pub const RUNTIME_SERVE_EXIT: &str = "runtime_serve_exit";

// Configuration controller events.
pub const PLUGIN_RECONFIGURE: &str = "plugin_reconfigure";
