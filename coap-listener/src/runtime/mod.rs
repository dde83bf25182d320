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

//! Runtime integration layer.
//!
//! Isolates the listener thread and its Tokio runtime so async/threading behavior
//! stays localized; the rest of the crate sees a bound address and a bounded join.

pub(crate) mod listener_runtime;
