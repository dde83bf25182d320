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

//! POST handling for the ingest resource: decode, forward, report.

use crate::data_plane::ingest_bridge::{IngestBridge, IngestError};
use crate::data_plane::payload_decoder::{self, DecodeError, FormatError, PayloadError};
use crate::observability::{events, fields};
use async_trait::async_trait;
use coap_lite::ResponseType;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, error};

const COMPONENT: &str = "request_handler";

/// Per-request failures, mapped to a CoAP response code by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    Decode(DecodeError),
    Format(FormatError),
    Ingest(IngestError),
}

impl RequestError {
    /// Response code the transport sends for this failure.
    pub fn response_type(&self) -> ResponseType {
        match self {
            RequestError::Decode(_) | RequestError::Format(_) => ResponseType::BadRequest,
            RequestError::Ingest(_) => ResponseType::InternalServerError,
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Decode(err) => write!(f, "{err}"),
            RequestError::Format(err) => write!(f, "{err}"),
            RequestError::Ingest(err) => write!(f, "unable to ingest readings: {err}"),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RequestError::Decode(err) => Some(err),
            RequestError::Format(err) => Some(err),
            RequestError::Ingest(err) => Some(err),
        }
    }
}

impl From<PayloadError> for RequestError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Decode(err) => RequestError::Decode(err),
            PayloadError::Format(err) => RequestError::Format(err),
        }
    }
}

/// A handler registered under a resource path of the listener.
///
/// Only POST requests reach the handler; an `Ok` result is answered with
/// `2.03 Valid` and an empty body.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn handle_post(&self, payload: &[u8]) -> Result<(), RequestError>;
}

/// Decodes sensor readings and forwards them through the ingest bridge.
#[derive(Clone)]
pub(crate) struct IngestRequestHandler {
    bridge: Arc<IngestBridge>,
}

impl IngestRequestHandler {
    pub(crate) fn new(bridge: Arc<IngestBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl ResourceHandler for IngestRequestHandler {
    async fn handle_post(&self, payload: &[u8]) -> Result<(), RequestError> {
        let batch = match payload_decoder::decode(payload) {
            Ok(batch) => batch,
            Err(PayloadError::Decode(err)) => {
                error!(
                    event = events::REQUEST_DECODE_FAILED,
                    component = COMPONENT,
                    payload_len = payload.len(),
                    err = %err,
                    "unable to decode request payload"
                );
                return Err(RequestError::Decode(err));
            }
            Err(PayloadError::Format(err)) => {
                error!(
                    event = events::REQUEST_FORMAT_REJECTED,
                    component = COMPONENT,
                    field = err.field,
                    err = %err,
                    "rejecting request payload"
                );
                return Err(RequestError::Format(err));
            }
        };

        if let Err(err) = self.bridge.forward(&batch) {
            error!(
                event = events::REQUEST_INGEST_FAILED,
                component = COMPONENT,
                asset = fields::format_optional(batch.asset.as_deref()),
                err = %err,
                "unable to hand readings to ingest sink"
            );
            return Err(RequestError::Ingest(err));
        }

        debug!(
            event = events::REQUEST_INGEST_OK,
            component = COMPONENT,
            asset = fields::format_optional(batch.asset.as_deref()),
            reading_count = batch.readings.len(),
            "readings ingested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{IngestRequestHandler, RequestError, ResourceHandler};
    use crate::data_plane::ingest_bridge::{IngestBridge, IngestError};
    use crate::reading_batch::ReadingBatch;
    use coap_lite::ResponseType;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn encode(document: &Value) -> Vec<u8> {
        let mut body = Vec::new();
        ciborium::ser::into_writer(document, &mut body).expect("document should encode");
        body
    }

    fn recording_handler() -> (IngestRequestHandler, Arc<Mutex<Vec<ReadingBatch>>>) {
        let bridge = Arc::new(IngestBridge::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_in_sink = received.clone();
        bridge
            .register(Arc::new(move |batch: &ReadingBatch| {
                received_in_sink.lock().unwrap().push(batch.clone());
            }))
            .expect("sink registration");
        (IngestRequestHandler::new(bridge), received)
    }

    #[tokio::test]
    async fn handle_post_forwards_decoded_batch_once() {
        let (handler, received) = recording_handler();
        let body = encode(&json!({
            "timestamp": "2017-01-02T01:02:03.23232Z-05:00",
            "asset": "sensor1",
            "key": "80a43623-ebe5-40d6-8d80-3f892da9b3b4",
            "readings": {"velocity": "500", "temperature": {"value": "32", "unit": "kelvin"}}
        }));

        handler
            .handle_post(&body)
            .await
            .expect("well-formed request should be accepted");

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].asset.as_deref(), Some("sensor1"));
        assert_eq!(received[0].readings["temperature"]["unit"], json!("kelvin"));
    }

    #[tokio::test]
    async fn handle_post_rejects_scalar_readings_without_forwarding() {
        let (handler, received) = recording_handler();
        let body = encode(&json!({"asset": "sensor2", "readings": "500"}));

        let err = handler
            .handle_post(&body)
            .await
            .expect_err("scalar readings must be rejected");

        assert!(matches!(err, RequestError::Format(_)));
        assert_eq!(err.response_type(), ResponseType::BadRequest);
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handle_post_rejects_undecodable_body() {
        let (handler, received) = recording_handler();

        let err = handler
            .handle_post(b"not cbor at all")
            .await
            .expect_err("garbage must be rejected");

        assert!(matches!(err, RequestError::Decode(_)));
        assert_eq!(err.response_type(), ResponseType::BadRequest);
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handle_post_without_sink_is_a_server_error() {
        let handler = IngestRequestHandler::new(Arc::new(IngestBridge::new()));
        let body = encode(&json!({"asset": "sensor1", "readings": {}}));

        let err = handler
            .handle_post(&body)
            .await
            .expect_err("missing sink must fail");

        assert_eq!(err, RequestError::Ingest(IngestError::NotRegistered));
        assert_eq!(err.response_type(), ResponseType::InternalServerError);
    }
}
