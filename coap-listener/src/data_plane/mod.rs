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

//! Data plane: payload decoding, ingest forwarding, CoAP request dispatch and deduplication.

pub(crate) mod exchange_cache;
pub(crate) mod ingest_bridge;
pub(crate) mod payload_decoder;
pub(crate) mod request_handler;
pub(crate) mod resource_dispatch;
