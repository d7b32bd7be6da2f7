//! Blocking waits on asynchronous platform events.
//!
//! The radio reports association results and address assignment through
//! its event loop, on a context the caller does not own. This module turns
//! those notifications into plain blocking calls:
//!
//! 1. A fresh one-shot channel is created for every wait.
//! 2. A sink holding the sender is registered for one event filter. When a
//!    matching event arrives, a capture function extracts the payload and
//!    the sink fires the channel. Only the first capture is kept.
//! 3. The caller blocks on the receiver. There is no timeout.
//! 4. Dropping the [`Subscription`] unregisters the sink, so no handler
//!    outlives the call that created it, whichever way that call exits.
//!
//! Subscribing is separate from waiting so callers can subscribe *before*
//! triggering the action whose outcome they wait for, and never miss an
//! event emitted in between.

use futures::channel::oneshot;
use futures::executor::block_on;
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};

use crate::Result;
use crate::api::models::{DisconnectReason, Ipv4Info, WifiError};
use crate::platform::EventDispatcher;
use crate::platform::events::{
    Event, EventBase, EventFilter, EventKind, EventSink, HandlerId, IpEvent, WifiEvent,
};

/// How an association attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkOutcome {
    Connected,
    Disconnected(DisconnectReason),
}

/// Sink side of a wait: the capture function plus the channel it fires.
struct Rendezvous<T> {
    capture: fn(&Event) -> Option<T>,
    signal: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T: Send> EventSink for Rendezvous<T> {
    fn deliver(&self, event: &Event) {
        let Some(payload) = (self.capture)(event) else {
            return;
        };

        let mut signal = self.signal.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = signal.take() {
            // The waiter may already have given up; nothing to do then.
            let _ = tx.send(payload);
        }
    }
}

/// A registered handler and the receiver it will signal.
///
/// Unregisters itself on drop.
pub(crate) struct Subscription<'a, E: EventDispatcher + ?Sized, T> {
    events: &'a E,
    id: HandlerId,
    signal: oneshot::Receiver<T>,
}

impl<E: EventDispatcher + ?Sized, T> Subscription<'_, E, T> {
    /// Blocks the calling thread until the captured payload arrives.
    pub(crate) fn wait(mut self) -> Result<T> {
        debug!("Waiting on handler {}", self.id);
        block_on(&mut self.signal).map_err(|_| {
            warn!("Handler {} was dropped before any event matched", self.id);
            WifiError::EventLoopClosed
        })
    }
}

impl<E: EventDispatcher + ?Sized, T> Drop for Subscription<'_, E, T> {
    fn drop(&mut self) {
        match self.events.unregister(self.id) {
            Ok(()) => debug!("Unregistered handler {}", self.id),
            Err(e) => warn!("Failed to unregister handler {}: {e}", self.id),
        }
    }
}

/// Registers a one-shot capture for events matching `filter`.
pub(crate) fn subscribe<E, T>(
    events: &E,
    filter: EventFilter,
    capture: fn(&Event) -> Option<T>,
) -> Result<Subscription<'_, E, T>>
where
    E: EventDispatcher + ?Sized,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let sink = Arc::new(Rendezvous {
        capture,
        signal: Mutex::new(Some(tx)),
    });

    let id = events.register(filter, sink)?;
    debug!("Registered handler {id} for {filter:?}");

    Ok(Subscription {
        events,
        id,
        signal: rx,
    })
}

/// Subscribes to the outcome of an association attempt.
pub(crate) fn subscribe_link<E>(events: &E) -> Result<Subscription<'_, E, LinkOutcome>>
where
    E: EventDispatcher + ?Sized,
{
    subscribe(events, EventFilter::any(EventBase::Wifi), link_outcome)
}

/// Subscribes to the station interface getting an address.
pub(crate) fn subscribe_address<E>(events: &E) -> Result<Subscription<'_, E, Ipv4Info>>
where
    E: EventDispatcher + ?Sized,
{
    subscribe(events, EventFilter::only(EventKind::StaGotIp), address_assigned)
}

fn link_outcome(event: &Event) -> Option<LinkOutcome> {
    match event {
        Event::Wifi(WifiEvent::StaConnected { .. }) => Some(LinkOutcome::Connected),
        Event::Wifi(WifiEvent::StaDisconnected { reason }) => {
            Some(LinkOutcome::Disconnected(*reason))
        }
        _ => None,
    }
}

fn address_assigned(event: &Event) -> Option<Ipv4Info> {
    match event {
        Event::Ip(IpEvent::StaGotIp(info)) => Some(*info),
        _ => None,
    }
}
