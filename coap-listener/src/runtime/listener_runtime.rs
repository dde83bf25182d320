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

//! Runtime helper for running the CoAP serve loop on its own thread.

use crate::data_plane::resource_dispatch::{self, IngestResource};
use crate::observability::{events, fields};
use std::io;
use std::net::SocketAddr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) const LISTENER_RUNTIME_THREAD_NAME: &str = "coap-listener";
const COMPONENT: &str = "listener_runtime";

/// Failures while bringing the listener thread up.
#[derive(Debug)]
pub(crate) enum SpawnError {
    Spawn(io::Error),
    Bind(io::Error),
    StartupTimedOut,
    ThreadExited,
}

/// How the listener thread ended when waited on.
pub(crate) enum JoinOutcome {
    Joined,
    Panicked,
    /// Still running; the caller decides how long to keep track of it.
    TimedOut(ListenerThread),
}

/// Handle to a running listener thread.
pub(crate) struct ListenerThread {
    join_handle: thread::JoinHandle<()>,
    exited: mpsc::Receiver<()>,
    local_addr: SocketAddr,
}

impl ListenerThread {
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Waits up to `grace` for the thread to exit.
    ///
    /// On timeout the handle is handed back unjoined; the thread keeps running
    /// until its serve loop observes cancellation.
    pub(crate) fn join_within(self, grace: Duration) -> JoinOutcome {
        match self.exited.recv_timeout(grace) {
            Err(RecvTimeoutError::Timeout) => JoinOutcome::TimedOut(self),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => match self.join_handle.join() {
                Ok(()) => JoinOutcome::Joined,
                Err(_) => JoinOutcome::Panicked,
            },
        }
    }
}

/// Spawns the listener thread and waits for it to bind `bind_addr`.
///
/// The thread owns a current-thread Tokio runtime; every request is a task on that
/// runtime. Returns once the socket is bound, so bind failures reach the caller.
pub(crate) fn spawn_listener_runtime(
    bind_addr: SocketAddr,
    resource: IngestResource,
    cancel: CancellationToken,
    startup_timeout: Duration,
) -> Result<ListenerThread, SpawnError> {
    let (startup_tx, startup_rx) = mpsc::sync_channel::<io::Result<SocketAddr>>(1);
    // dropped when the thread body returns or unwinds
    let (exit_tx, exited) = mpsc::channel::<()>();
    let serve_cancel = cancel.clone();

    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        listener_thread = LISTENER_RUNTIME_THREAD_NAME,
        bind_addr = %bind_addr,
        path = resource.path(),
        "spawning listener runtime thread"
    );

    let join_handle = thread::Builder::new()
        .name(LISTENER_RUNTIME_THREAD_NAME.to_string())
        .spawn(move || {
            let _exit_tx = exit_tx;
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = startup_tx.send(Err(err));
                    return;
                }
            };

            runtime.block_on(async move {
                let socket = match UdpSocket::bind(bind_addr).await {
                    Ok(socket) => socket,
                    Err(err) => {
                        let _ = startup_tx.send(Err(err));
                        return;
                    }
                };
                let local_addr = match socket.local_addr() {
                    Ok(local_addr) => local_addr,
                    Err(err) => {
                        let _ = startup_tx.send(Err(err));
                        return;
                    }
                };
                if startup_tx.send(Ok(local_addr)).is_err() {
                    return;
                }
                resource_dispatch::serve(socket, resource, serve_cancel).await;
            });

            debug!(
                event = events::RUNTIME_SERVE_EXIT,
                component = COMPONENT,
                listener_thread = fields::current_thread_name_or_default().as_str(),
                "listener runtime thread exiting"
            );
        })
        .map_err(|err| {
            warn!(
                event = events::RUNTIME_SPAWN_FAILED,
                component = COMPONENT,
                err = %err,
                "unable to spawn listener runtime thread"
            );
            SpawnError::Spawn(err)
        })?;

    match await_startup(&startup_rx, startup_timeout) {
        Ok(local_addr) => {
            debug!(
                event = events::RUNTIME_SPAWN_OK,
                component = COMPONENT,
                listener_thread = LISTENER_RUNTIME_THREAD_NAME,
                local_addr = %local_addr,
                "listener runtime thread bound"
            );
            Ok(ListenerThread {
                join_handle,
                exited,
                local_addr,
            })
        }
        Err(SpawnError::StartupTimedOut) => {
            // the thread exits on its own once it sees the token
            cancel.cancel();
            Err(SpawnError::StartupTimedOut)
        }
        Err(err) => {
            let _ = join_handle.join();
            Err(err)
        }
    }
}

/// Waits for the listener thread to report its bind result.
fn await_startup(
    startup_rx: &mpsc::Receiver<io::Result<SocketAddr>>,
    startup_timeout: Duration,
) -> Result<SocketAddr, SpawnError> {
    match startup_rx.recv_timeout(startup_timeout) {
        Ok(Ok(local_addr)) => Ok(local_addr),
        Ok(Err(err)) => Err(SpawnError::Bind(err)),
        Err(RecvTimeoutError::Timeout) => Err(SpawnError::StartupTimedOut),
        Err(RecvTimeoutError::Disconnected) => Err(SpawnError::ThreadExited),
    }
}

#[cfg(test)]
mod tests {
    use super::{await_startup, spawn_listener_runtime, JoinOutcome, SpawnError};
    use crate::data_plane::request_handler::{RequestError, ResourceHandler};
    use crate::data_plane::resource_dispatch::IngestResource;
    use async_trait::async_trait;
    use std::io;
    use std::net::{SocketAddr, UdpSocket};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
    const GRACE: Duration = Duration::from_secs(2);

    struct AcceptAll;

    #[async_trait]
    impl ResourceHandler for AcceptAll {
        async fn handle_post(&self, _payload: &[u8]) -> Result<(), RequestError> {
            Ok(())
        }
    }

    fn resource() -> IngestResource {
        IngestResource::new("sensor-values", Arc::new(AcceptAll))
    }

    fn loopback_any_port() -> SocketAddr {
        "127.0.0.1:0".parse().expect("loopback address")
    }

    #[test]
    fn spawned_runtime_reports_bound_address_and_exits_on_cancel() {
        let cancel = CancellationToken::new();
        let listener =
            spawn_listener_runtime(loopback_any_port(), resource(), cancel.clone(), STARTUP_TIMEOUT)
                .expect("listener should bind");

        assert_ne!(listener.local_addr().port(), 0);
        assert!(!listener.is_finished());

        cancel.cancel();
        assert!(matches!(listener.join_within(GRACE), JoinOutcome::Joined));
    }

    #[test]
    fn bind_conflict_is_reported_to_the_caller() {
        let occupied = UdpSocket::bind("127.0.0.1:0").expect("occupy a port");
        let taken = occupied.local_addr().expect("occupied address");

        let result =
            spawn_listener_runtime(taken, resource(), CancellationToken::new(), STARTUP_TIMEOUT);

        assert!(matches!(result, Err(SpawnError::Bind(_))));
    }

    #[test]
    fn silent_listener_thread_times_out_startup() {
        let (_startup_tx, startup_rx) = mpsc::sync_channel::<io::Result<SocketAddr>>(1);

        let result = await_startup(&startup_rx, Duration::from_millis(50));

        assert!(matches!(result, Err(SpawnError::StartupTimedOut)));
    }

    #[test]
    fn listener_thread_gone_before_reporting_is_an_exit() {
        let (startup_tx, startup_rx) = mpsc::sync_channel::<io::Result<SocketAddr>>(1);
        drop(startup_tx);

        let result = await_startup(&startup_rx, STARTUP_TIMEOUT);

        assert!(matches!(result, Err(SpawnError::ThreadExited)));
    }
}
