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

//! CoAP datagram dispatch onto the registered resource and the serve loop driving it.
//!
//! Confirmable retransmissions are answered from the exchange cache with the
//! bytes sent the first time; the handler runs once per `(peer, message id)`.

use crate::data_plane::exchange_cache::{ExchangeCache, ExchangeLookup};
use crate::data_plane::request_handler::ResourceHandler;
use crate::observability::{events, fields};
use coap_lite::{CoapRequest, MessageClass, MessageType, Packet, RequestType, ResponseType};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Level};

const COMPONENT: &str = "resource_dispatch";

/// Receive buffer size; no UDP payload is larger.
pub(crate) const MAX_DATAGRAM_SIZE: usize = 65_535;

/// A handler bound to one resource path.
#[derive(Clone)]
pub(crate) struct IngestResource {
    path: String,
    handler: Arc<dyn ResourceHandler>,
    exchanges: Arc<ExchangeCache>,
}

impl IngestResource {
    pub(crate) fn new(path: &str, handler: Arc<dyn ResourceHandler>) -> Self {
        Self {
            path: path.trim_matches('/').to_string(),
            handler,
            exchanges: Arc::new(ExchangeCache::new()),
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    /// Produces the encoded response for one datagram, or `None` when nothing is sent back.
    pub(crate) async fn dispatch_datagram(
        &self,
        datagram: &[u8],
        peer: SocketAddr,
    ) -> Option<Vec<u8>> {
        let packet = match Packet::from_bytes(datagram) {
            Ok(packet) => packet,
            Err(err) => {
                debug!(
                    event = events::DATAGRAM_DROP_MALFORMED,
                    component = COMPONENT,
                    peer = %peer,
                    err = ?err,
                    "dropping datagram that is not a CoAP message"
                );
                return None;
            }
        };

        if !matches!(packet.header.code, MessageClass::Request(_)) {
            debug!(
                event = events::DATAGRAM_DROP_NOT_A_REQUEST,
                component = COMPONENT,
                peer = %peer,
                code = fields::format_packet_code(&packet).as_str(),
                "dropping CoAP message that is not a request"
            );
            return None;
        }

        let request: CoapRequest<SocketAddr> = CoapRequest::from_packet(packet, peer);
        if request.response.is_none() {
            debug!(
                event = events::DATAGRAM_DROP_NOT_A_REQUEST,
                component = COMPONENT,
                peer = %peer,
                msg_id = request.message.header.message_id,
                "dropping request that cannot be answered"
            );
            return None;
        }

        let message_id = request.message.header.message_id;
        let exchange = (peer, message_id);
        match self.exchanges.begin(exchange) {
            ExchangeLookup::New => {}
            ExchangeLookup::Answered(reply)
                if request.message.header.get_type() == MessageType::Confirmable =>
            {
                debug!(
                    event = events::REQUEST_DUPLICATE_REPLAYED,
                    component = COMPONENT,
                    peer = %peer,
                    msg_id = message_id,
                    "resending cached response for retransmitted request"
                );
                return reply;
            }
            _ => {
                debug!(
                    event = events::REQUEST_DUPLICATE_DROPPED,
                    component = COMPONENT,
                    peer = %peer,
                    msg_id = message_id,
                    "dropping duplicate request"
                );
                return None;
            }
        }

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::DATAGRAM_RECEIVE,
                component = COMPONENT,
                peer = %peer,
                msg_id = message_id,
                code = fields::format_packet_code(&request.message).as_str(),
                path = request.get_path().as_str(),
                "received CoAP request"
            );
        }

        let status = self.resolve_status(&request, peer).await;
        let reply = encode_response(request, status, peer);
        self.exchanges.complete(exchange, reply.clone());
        reply
    }

    async fn resolve_status(
        &self,
        request: &CoapRequest<SocketAddr>,
        peer: SocketAddr,
    ) -> ResponseType {
        let path = request.get_path();
        if path.trim_matches('/') != self.path {
            debug!(
                event = events::REQUEST_PATH_NOT_FOUND,
                component = COMPONENT,
                peer = %peer,
                path = path.as_str(),
                "no resource registered under path"
            );
            return ResponseType::NotFound;
        }

        if *request.get_method() != RequestType::Post {
            debug!(
                event = events::REQUEST_METHOD_NOT_ALLOWED,
                component = COMPONENT,
                peer = %peer,
                method = ?request.get_method(),
                "only POST is accepted"
            );
            return ResponseType::MethodNotAllowed;
        }

        match self.handler.handle_post(&request.message.payload).await {
            Ok(()) => ResponseType::Valid,
            Err(err) => err.response_type(),
        }
    }
}

fn encode_response(
    mut request: CoapRequest<SocketAddr>,
    status: ResponseType,
    peer: SocketAddr,
) -> Option<Vec<u8>> {
    let mut response = request.response.take()?;
    response.set_status(status);
    response.message.payload = Vec::new();

    match response.message.to_bytes() {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(
                event = events::RESPONSE_ENCODE_FAILED,
                component = COMPONENT,
                peer = %peer,
                err = ?err,
                "unable to encode CoAP response"
            );
            None
        }
    }
}

/// Receives datagrams until `cancel` fires, answering each one from its own task.
///
/// Requests are interleaved on the caller's runtime; a slow handler never holds
/// up the receive loop.
pub(crate) async fn serve(socket: UdpSocket, resource: IngestResource, cancel: CancellationToken) {
    let socket = Arc::new(socket);
    let resource = Arc::new(resource);
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(
                    event = events::RUNTIME_SERVE_EXIT,
                    component = COMPONENT,
                    reason = fields::REASON_CANCELLED,
                    "serve loop cancelled"
                );
                break;
            }
            received = socket.recv_from(&mut buffer) => match received {
                Ok((len, peer)) => {
                    let datagram = buffer[..len].to_vec();
                    let socket = socket.clone();
                    let resource = resource.clone();
                    tokio::spawn(async move {
                        let Some(reply) = resource.dispatch_datagram(&datagram, peer).await else {
                            return;
                        };
                        match socket.send_to(&reply, peer).await {
                            Ok(_) => debug!(
                                event = events::RESPONSE_SEND_OK,
                                component = COMPONENT,
                                peer = %peer,
                                "response sent"
                            ),
                            Err(err) => warn!(
                                event = events::RESPONSE_SEND_FAILED,
                                component = COMPONENT,
                                peer = %peer,
                                err = %err,
                                "unable to send response"
                            ),
                        }
                    });
                }
                Err(err) => {
                    // ICMP port-unreachable from an earlier reply surfaces here on some platforms
                    warn!(
                        event = events::DATAGRAM_RECV_FAILED,
                        component = COMPONENT,
                        err = %err,
                        "datagram receive failed"
                    );
                }
            }
        }
    }
}
