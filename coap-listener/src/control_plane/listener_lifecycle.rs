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

//! Listener lifecycle state machine: start, stop, and sequential restart.

use crate::config::ListenerSettings;
use crate::data_plane::ingest_bridge::IngestBridge;
use crate::data_plane::request_handler::IngestRequestHandler;
use crate::data_plane::resource_dispatch::IngestResource;
use crate::observability::{events, fields};
use crate::runtime::listener_runtime::{
    spawn_listener_runtime, JoinOutcome, ListenerThread, SpawnError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const COMPONENT: &str = "listener_lifecycle";

pub(crate) const LISTEN_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(2);
pub(crate) const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable states of the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Failures for listener start.
#[derive(Debug)]
pub enum LifecycleError {
    AlreadyRunning,
    Bind { port: u16, source: io::Error },
    Spawn(io::Error),
    StartupTimedOut { port: u16 },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::AlreadyRunning => write!(f, "listener is already running"),
            LifecycleError::Bind { port, source } => {
                write!(f, "unable to bind listener on port {port}: {source}")
            }
            LifecycleError::Spawn(err) => write!(f, "unable to spawn listener thread: {err}"),
            LifecycleError::StartupTimedOut { port } => {
                write!(f, "listener on port {port} did not come up in time")
            }
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LifecycleError::Bind { source, .. } => Some(source),
            LifecycleError::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// The listener thread did not exit within the grace period and was detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownTimeoutError {
    pub grace_period: Duration,
}

impl Display for ShutdownTimeoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "listener thread did not exit within {:?}; detached",
            self.grace_period
        )
    }
}

impl Error for ShutdownTimeoutError {}

/// Live state of a started listener; only exists while the listener is up.
struct ListenerHandle {
    cancel: CancellationToken,
    thread: ListenerThread,
    settings: ListenerSettings,
}

/// Owns the one listener thread and serializes its start/stop transitions.
///
/// Threads detached after a grace-period overrun are kept until they finish so
/// [`ListenerLifecycle::has_listener_thread`] still sees them.
pub(crate) struct ListenerLifecycle {
    state: ListenerState,
    handle: Option<ListenerHandle>,
    detached: Vec<ListenerThread>,
    bridge: Arc<IngestBridge>,
    grace_period: Duration,
}

impl ListenerLifecycle {
    pub(crate) fn new(bridge: Arc<IngestBridge>, grace_period: Duration) -> Self {
        Self {
            state: ListenerState::Stopped,
            handle: None,
            detached: Vec::new(),
            bridge,
            grace_period,
        }
    }

    pub(crate) fn state(&self) -> ListenerState {
        self.state
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.as_ref().map(|handle| handle.thread.local_addr())
    }

    pub(crate) fn settings(&self) -> Option<&ListenerSettings> {
        self.handle.as_ref().map(|handle| &handle.settings)
    }

    /// True while any listener thread started here is alive, detached ones included.
    pub(crate) fn has_listener_thread(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.thread.is_finished())
            || self.detached_threads() > 0
    }

    /// Listener threads that overran a stop and have not exited yet.
    pub(crate) fn detached_threads(&self) -> usize {
        self.detached
            .iter()
            .filter(|thread| !thread.is_finished())
            .count()
    }

    /// Binds `0.0.0.0:port` on a fresh listener thread and serves `uri` there.
    ///
    /// Returns once the socket is bound. Only valid from `Stopped`.
    pub(crate) fn start(
        &mut self,
        settings: &ListenerSettings,
    ) -> Result<SocketAddr, LifecycleError> {
        if self.state != ListenerState::Stopped || self.handle.is_some() {
            return Err(LifecycleError::AlreadyRunning);
        }
        self.detached.retain(|detached| !detached.is_finished());

        self.state = ListenerState::Starting;
        debug!(
            event = events::LISTENER_START_REQUESTED,
            component = COMPONENT,
            port = settings.port,
            uri = settings.uri.as_str(),
            "starting listener"
        );

        let handler = Arc::new(IngestRequestHandler::new(self.bridge.clone()));
        let resource = IngestResource::new(&settings.uri, handler);
        let cancel = CancellationToken::new();
        let bind_addr = SocketAddr::new(LISTEN_IP, settings.port);

        match spawn_listener_runtime(bind_addr, resource, cancel.clone(), STARTUP_TIMEOUT) {
            Ok(thread) => {
                let local_addr = thread.local_addr();
                self.handle = Some(ListenerHandle {
                    cancel,
                    thread,
                    settings: settings.clone(),
                });
                self.state = ListenerState::Running;
                debug!(
                    event = events::LISTENER_STARTED,
                    component = COMPONENT,
                    local_addr = %local_addr,
                    uri = settings.uri.as_str(),
                    "listener running"
                );
                Ok(local_addr)
            }
            Err(err) => {
                self.state = ListenerState::Stopped;
                let err = lifecycle_error(err, settings.port);
                debug!(
                    event = events::LISTENER_START_FAILED,
                    component = COMPONENT,
                    port = settings.port,
                    err = %err,
                    "listener failed to start"
                );
                Err(err)
            }
        }
    }

    /// Cancels the serve loop and waits, bounded by the grace period, for the thread.
    ///
    /// Always ends in `Stopped`; stopping a stopped listener is a no-op.
    pub(crate) fn stop(&mut self) -> Result<(), ShutdownTimeoutError> {
        let Some(handle) = self.handle.take() else {
            self.state = ListenerState::Stopped;
            debug!(
                event = events::LISTENER_STOP_NOOP,
                component = COMPONENT,
                reason = fields::REASON_ALREADY_STOPPED,
                "listener already stopped"
            );
            return Ok(());
        };

        self.state = ListenerState::Stopping;
        debug!(
            event = events::LISTENER_STOP_REQUESTED,
            component = COMPONENT,
            port = handle.settings.port,
            "stopping listener"
        );

        handle.cancel.cancel();
        let outcome = handle.thread.join_within(self.grace_period);
        self.state = ListenerState::Stopped;

        match outcome {
            JoinOutcome::Joined => {
                debug!(
                    event = events::LISTENER_STOPPED,
                    component = COMPONENT,
                    port = handle.settings.port,
                    "listener stopped"
                );
                Ok(())
            }
            JoinOutcome::Panicked => {
                warn!(
                    event = events::LISTENER_THREAD_PANICKED,
                    component = COMPONENT,
                    port = handle.settings.port,
                    "listener thread panicked before shutdown"
                );
                Ok(())
            }
            JoinOutcome::TimedOut(thread) => {
                self.detached.retain(|detached| !detached.is_finished());
                self.detached.push(thread);
                let err = ShutdownTimeoutError {
                    grace_period: self.grace_period,
                };
                warn!(
                    event = events::LISTENER_STOP_TIMEOUT,
                    component = COMPONENT,
                    port = handle.settings.port,
                    reason = fields::REASON_GRACE_PERIOD_EXCEEDED,
                    err = %err,
                    "listener thread did not stop in time; detaching it"
                );
                Err(err)
            }
        }
    }

    /// Stops the current listener, then starts a new one; the two never overlap.
    pub(crate) fn restart(
        &mut self,
        settings: &ListenerSettings,
    ) -> Result<SocketAddr, LifecycleError> {
        // a timed-out stop is already logged; the new bind reports any leftover conflict
        let _ = self.stop();
        self.start(settings)
    }
}

fn lifecycle_error(err: SpawnError, port: u16) -> LifecycleError {
    match err {
        SpawnError::Bind(source) => LifecycleError::Bind { port, source },
        SpawnError::Spawn(source) => LifecycleError::Spawn(source),
        SpawnError::StartupTimedOut => LifecycleError::StartupTimedOut { port },
        SpawnError::ThreadExited => {
            LifecycleError::Spawn(io::Error::other("listener thread exited during startup"))
        }
    }
}

impl Drop for ListenerLifecycle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}
