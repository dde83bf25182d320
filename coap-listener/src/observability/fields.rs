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

//! Canonical structured field keys and value-format helpers.

use coap_lite::{MessageClass, Packet};

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const LISTENER_THREAD: &str = "listener_thread";

pub const PEER: &str = "peer";
pub const MSG_ID: &str = "msg_id";
pub const CODE: &str = "code";
pub const PATH: &str = "path";
pub const PORT: &str = "port";
pub const URI: &str = "uri";
pub const ASSET: &str = "asset";
pub const READING_COUNT: &str = "reading_count";

pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_ALREADY_STOPPED: &str = "already_stopped";
pub const REASON_GRACE_PERIOD_EXCEEDED: &str = "grace_period_exceeded";
pub const DEFAULT_LISTENER_THREAD: &str = "unknown-thread";

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_LISTENER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Renders a CoAP code in the dotted `c.dd` form used by RFC 7252.
pub fn format_code(class: &MessageClass) -> String {
    let raw = u8::from(*class);
    format!("{}.{:02}", raw >> 5, raw & 0x1f)
}

pub fn format_packet_code(packet: &Packet) -> String {
    format_code(&packet.header.code)
}

pub fn format_optional(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}
