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

//! Single registration point for the host ingestion sink.

use crate::observability::{events, fields};
use crate::reading_batch::ReadingBatch;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

const COMPONENT: &str = "ingest_bridge";

///
/// [`IngestSink`] is the host capability that persists or forwards accepted readings.
///
/// It is invoked once per accepted request, from the listener's run-loop thread, so
/// implementations should hand the batch off quickly rather than block.
///
/// Any `Fn(&ReadingBatch) + Send + Sync` closure is an [`IngestSink`].
///
/// # Examples
///
/// ```
/// use coap_listener::{IngestSink, ReadingBatch};
///
/// let sink = |batch: &ReadingBatch| println!("asset: {:?}", batch.asset);
/// sink.ingest(&ReadingBatch::default());
/// ```
pub trait IngestSink: Send + Sync {
    fn ingest(&self, batch: &ReadingBatch);
}

impl<F> IngestSink for F
where
    F: Fn(&ReadingBatch) + Send + Sync,
{
    fn ingest(&self, batch: &ReadingBatch) {
        self(batch)
    }
}

/// Failures for sink registration and forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    NotRegistered,
    AlreadyRegistered,
    SinkPanicked,
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::NotRegistered => write!(f, "no ingest sink has been registered"),
            IngestError::AlreadyRegistered => write!(f, "an ingest sink is already registered"),
            IngestError::SinkPanicked => write!(f, "ingest sink panicked while handling readings"),
        }
    }
}

impl Error for IngestError {}

/// Holds the one ingest sink of the process and forwards batches to it.
#[derive(Default)]
pub(crate) struct IngestBridge {
    sink: OnceLock<Arc<dyn IngestSink>>,
}

impl IngestBridge {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores the sink; the first registration wins for the life of the bridge.
    pub(crate) fn register(&self, sink: Arc<dyn IngestSink>) -> Result<(), IngestError> {
        match self.sink.set(sink) {
            Ok(()) => {
                debug!(
                    event = events::INGEST_SINK_REGISTERED,
                    component = COMPONENT,
                    "ingest sink registered"
                );
                Ok(())
            }
            Err(_rejected) => {
                warn!(
                    event = events::INGEST_SINK_REGISTER_REJECTED,
                    component = COMPONENT,
                    "ingest sink already registered; keeping the existing sink"
                );
                Err(IngestError::AlreadyRegistered)
            }
        }
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.sink.get().is_some()
    }

    /// Hands one batch to the sink. Nothing is buffered or retried.
    pub(crate) fn forward(&self, batch: &ReadingBatch) -> Result<(), IngestError> {
        let sink = self.sink.get().ok_or(IngestError::NotRegistered)?;

        panic::catch_unwind(AssertUnwindSafe(|| sink.ingest(batch))).map_err(|_| {
            warn!(
                event = events::INGEST_SINK_PANICKED,
                component = COMPONENT,
                asset = fields::format_optional(batch.asset.as_deref()),
                "ingest sink panicked"
            );
            IngestError::SinkPanicked
        })
    }
}
