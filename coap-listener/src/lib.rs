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

//! # coap-listener
//!
//! `coap-listener` is an embeddable CoAP south-side listener. It accepts CBOR-encoded
//! sensor readings posted to one configurable resource and hands each decoded batch
//! to an ingestion sink registered by the host.
//!
//! Typical usage is centered on [`CoapPlugin`], or on the process-wide free functions
//! in [`plugin`] when the host expects a single plugin per process.
//!
//! ## Quick start
//!
//! ```
//! use coap_listener::{CoapPlugin, ListenerState, PluginConfig, ReadingBatch};
//! use std::sync::Arc;
//!
//! let plugin = CoapPlugin::new();
//! plugin.register_ingest(Arc::new(|batch: &ReadingBatch| {
//!     println!("{:?}: {} readings", batch.asset, batch.readings.len());
//! }));
//!
//! let mut config = PluginConfig::with_default_values();
//! config.set_value("port", "0");
//! let config = plugin.init(config).unwrap();
//! plugin.start(config.clone()).unwrap();
//! assert_eq!(plugin.state(), ListenerState::Running);
//!
//! let mut moved = config.clone();
//! moved.set_value("uri", "readings");
//! let config = plugin.reconfigure(config, moved).unwrap();
//! assert_eq!(plugin.listener_settings().unwrap().uri, "readings");
//!
//! plugin.shutdown(config);
//! assert_eq!(plugin.state(), ListenerState::Stopped);
//! ```
//!
//! ## Request contract
//!
//! Only `POST` to the configured path is accepted. Responses carry no payload:
//!
//! - `2.03 Valid`: the payload decoded and the sink accepted the batch
//! - `4.00 Bad Request`: the payload is not a CBOR map, or its readings are not a map
//! - `5.00 Internal Server Error`: no sink is registered, or the sink panicked
//! - `4.04 Not Found` / `4.05 Method Not Allowed`: wrong path or method
//!
//! A confirmable request retransmitted with the same message id is answered with
//! the original response and is not ingested again.
//!
//! ## Internal architecture map
//!
//! - Control surface: [`CoapPlugin`] and the [`plugin`] entry points
//! - Control plane: listener lifecycle state machine
//! - Data plane: CBOR payload decoding, request handling, ingest bridge, resource dispatch,
//!   exchange deduplication
//! - Runtime: dedicated listener thread owning a current-thread Tokio runtime
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. Hosts and
//! tests are responsible for one-time `tracing_subscriber` initialization.

mod coap_plugin;
pub use coap_plugin::{CoapPlugin, PluginError, PluginInfo, PLUGIN_VERSION};

mod config;
pub use config::{
    ConfigError, ConfigItem, ListenerSettings, PluginConfig, DEFAULT_PORT, DEFAULT_URI,
};

mod control_plane;
pub use control_plane::listener_lifecycle::{
    LifecycleError, ListenerState, ShutdownTimeoutError, DEFAULT_SHUTDOWN_GRACE_PERIOD,
};

mod data_plane;
pub use data_plane::ingest_bridge::{IngestError, IngestSink};
pub use data_plane::payload_decoder::{decode, DecodeError, FormatError, PayloadError};
pub use data_plane::request_handler::{RequestError, ResourceHandler};

#[doc(hidden)]
pub mod observability;
pub mod plugin;

mod reading_batch;
pub use reading_batch::{ReadingBatch, Readings};

mod runtime;
