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

use coap_listener::{IngestSink, ReadingBatch};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Ingest sink that keeps every batch it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<ReadingBatch>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn batches(&self) -> Vec<ReadingBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.batches.lock().unwrap().clear();
    }
}

impl IngestSink for RecordingSink {
    fn ingest(&self, batch: &ReadingBatch) {
        debug!("within recording_sink! batch: {:?}", batch);
        self.batches.lock().unwrap().push(batch.clone());
    }
}
