use log::debug;
use std::sync::Arc;

use super::{World, targets};
use crate::api::models::{DriverError, DriverErrorKind};
use crate::platform::events::{EventFilter, EventSink, HandlerId};
use crate::platform::{DriverResult, EventDispatcher};

/// Simulated default event loop.
///
/// Owns the dispatcher runtime: handlers run on its single worker thread,
/// never on the caller's.
pub struct SimEvents {
    world: Arc<World>,
    _runtime: tokio::runtime::Runtime,
}

impl SimEvents {
    pub(super) fn new(world: Arc<World>, runtime: tokio::runtime::Runtime) -> Self {
        Self {
            world,
            _runtime: runtime,
        }
    }
}

impl EventDispatcher for SimEvents {
    fn create_default_loop(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("event_loop_create_default")?;
        state.loop_created = true;
        Ok(())
    }

    fn register(&self, filter: EventFilter, sink: Arc<dyn EventSink>) -> DriverResult<HandlerId> {
        let mut state = self.world.lock();
        state.injected("event_handler_register")?;
        if !state.loop_created {
            return Err(DriverError::new(
                "event_handler_register",
                DriverErrorKind::NotInitialized,
            ));
        }
        drop(state);

        let id = HandlerId::new();
        self.world.handlers().insert(id, (filter, sink));
        debug!(target: targets::WIFI, "handler {id} registered for {filter:?}");
        Ok(id)
    }

    fn unregister(&self, id: HandlerId) -> DriverResult<()> {
        self.world.lock().injected("event_handler_unregister")?;
        match self.world.handlers().remove(&id) {
            Some(_) => Ok(()),
            None => Err(DriverError::new(
                "event_handler_unregister",
                DriverErrorKind::NotFound,
            )),
        }
    }
}
