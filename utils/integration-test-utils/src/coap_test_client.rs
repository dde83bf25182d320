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

use coap_lite::{CoapRequest, MessageType, Packet, RequestType};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tracing::debug;

pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(3);

static NEXT_MESSAGE_ID: AtomicU16 = AtomicU16::new(1);

/// Blocking loopback CoAP client for driving a listener from tests.
pub struct CoapTestClient {
    socket: UdpSocket,
    port: u16,
}

impl CoapTestClient {
    pub fn new(port: u16) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("client socket should bind");
        socket
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("client read timeout");
        Self { socket, port }
    }

    /// Sends `datagram` as-is and returns the decoded reply, if one arrives in time.
    pub fn exchange(&self, datagram: &[u8]) -> Option<Packet> {
        self.socket
            .send_to(datagram, ("127.0.0.1", self.port))
            .expect("datagram should send");

        let mut buffer = [0u8; 1500];
        match self.socket.recv_from(&mut buffer) {
            Ok((len, _)) => {
                Some(Packet::from_bytes(&buffer[..len]).expect("reply should be a CoAP message"))
            }
            Err(err) => {
                debug!("no reply from port {}: {err}", self.port);
                None
            }
        }
    }

    pub fn request(
        &self,
        method: RequestType,
        path: &str,
        body: &[u8],
        message_type: MessageType,
    ) -> Option<Packet> {
        self.exchange(&request_bytes(method, path, body, message_type))
    }
}

/// Encodes a CoAP request carrying `body` with a fresh message id and a fixed token.
pub fn post_request_bytes(path: &str, body: &[u8], message_type: MessageType) -> Vec<u8> {
    request_bytes(RequestType::Post, path, body, message_type)
}

fn request_bytes(
    method: RequestType,
    path: &str,
    body: &[u8],
    message_type: MessageType,
) -> Vec<u8> {
    let mut request: CoapRequest<SocketAddr> = CoapRequest::new();
    request.set_method(method);
    request.set_path(path);
    request.message.header.set_type(message_type);
    request.message.header.message_id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
    request.message.set_token(vec![0x5e, 0x75]);
    request.message.payload = body.to_vec();
    request.message.to_bytes().expect("request should encode")
}

/// One-shot POST to `127.0.0.1:port`.
pub fn post(port: u16, path: &str, body: &[u8], message_type: MessageType) -> Option<Packet> {
    CoapTestClient::new(port).request(RequestType::Post, path, body, message_type)
}

/// One-shot raw datagram to `127.0.0.1:port`.
pub fn send_raw(port: u16, datagram: &[u8]) -> Option<Packet> {
    CoapTestClient::new(port).exchange(datagram)
}
