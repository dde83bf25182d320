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

//! Message-id deduplication for retransmitted requests (RFC 7252, section 4.5).

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// RFC 7252 `EXCHANGE_LIFETIME` with the default transmission parameters.
pub(crate) const EXCHANGE_LIFETIME: Duration = Duration::from_secs(247);

/// Upper bound on remembered exchanges; the oldest is evicted first.
pub(crate) const EXCHANGE_CAPACITY: usize = 4096;

/// A request is identified by its sender and message id.
pub(crate) type ExchangeKey = (SocketAddr, u16);

/// What the dispatcher should do with an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExchangeLookup {
    /// First sighting; the request must be handled and then completed.
    New,
    /// A copy of this request is still being handled.
    InFlight,
    /// Already answered; resend these bytes, if any, without handling again.
    Answered(Option<Vec<u8>>),
}

enum ExchangeEntry {
    InFlight,
    Answered(Option<Vec<u8>>),
}

struct Slot {
    seen_at: Instant,
    entry: ExchangeEntry,
}

#[derive(Default)]
struct Exchanges {
    slots: HashMap<ExchangeKey, Slot>,
    order: VecDeque<(ExchangeKey, Instant)>,
}

impl Exchanges {
    fn forget_expired(&mut self, now: Instant, lifetime: Duration) {
        while let Some(&(_, seen_at)) = self.order.front() {
            if now.saturating_duration_since(seen_at) < lifetime {
                break;
            }
            self.forget_front();
        }
    }

    fn make_room(&mut self, capacity: usize) {
        while self.slots.len() >= capacity && !self.order.is_empty() {
            self.forget_front();
        }
    }

    fn forget_front(&mut self) {
        let Some((key, seen_at)) = self.order.pop_front() else {
            return;
        };
        // a key may have been re-inserted after an earlier expiry
        if self
            .slots
            .get(&key)
            .is_some_and(|slot| slot.seen_at == seen_at)
        {
            self.slots.remove(&key);
        }
    }
}

/// Bounded, time-expiring record of recently seen requests and their replies.
pub(crate) struct ExchangeCache {
    lifetime: Duration,
    capacity: usize,
    exchanges: Mutex<Exchanges>,
}

impl ExchangeCache {
    pub(crate) fn new() -> Self {
        Self::with_limits(EXCHANGE_LIFETIME, EXCHANGE_CAPACITY)
    }

    pub(crate) fn with_limits(lifetime: Duration, capacity: usize) -> Self {
        Self {
            lifetime,
            capacity: capacity.max(1),
            exchanges: Mutex::new(Exchanges::default()),
        }
    }

    /// Looks `key` up and, on first sighting, marks it in flight.
    pub(crate) fn begin(&self, key: ExchangeKey) -> ExchangeLookup {
        let now = Instant::now();
        let mut exchanges = self.exchanges();
        exchanges.forget_expired(now, self.lifetime);

        if let Some(slot) = exchanges.slots.get(&key) {
            return match &slot.entry {
                ExchangeEntry::InFlight => ExchangeLookup::InFlight,
                ExchangeEntry::Answered(reply) => ExchangeLookup::Answered(reply.clone()),
            };
        }

        exchanges.make_room(self.capacity);
        exchanges.slots.insert(
            key,
            Slot {
                seen_at: now,
                entry: ExchangeEntry::InFlight,
            },
        );
        exchanges.order.push_back((key, now));
        ExchangeLookup::New
    }

    /// Records the reply for an exchange started with [`ExchangeCache::begin`].
    pub(crate) fn complete(&self, key: ExchangeKey, reply: Option<Vec<u8>>) {
        if let Some(slot) = self.exchanges().slots.get_mut(&key) {
            slot.entry = ExchangeEntry::Answered(reply);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.exchanges().slots.len()
    }

    fn exchanges(&self) -> MutexGuard<'_, Exchanges> {
        self.exchanges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
