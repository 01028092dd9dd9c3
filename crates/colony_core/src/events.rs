//! Synchronous publish/subscribe for simulation notifications.
//!
//! Handlers run on the publishing call stack, in registration order. A
//! handler receives the bus itself and may publish further events; those
//! run depth-first before the outer publish continues. Nesting is capped
//! at a configurable depth so a handler that republishes its own event
//! cannot recurse forever.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::components::EntityId;

/// Notification emitted by the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A purchase was refused.
    NotEnoughResources {
        /// Resource the faction is short of.
        resource_name: String,
        /// Unit or building that was requested.
        unit_being_built: String,
    },
    /// A unit was requested before its tech was unlocked.
    UnitNotUnlocked {
        /// Requested unit.
        unit_name: String,
    },
    /// A scripted scene finished.
    SceneCompletion {
        /// Royal ant taking part in the scene.
        royal_ant_id: EntityId,
        /// Royal roach taking part in the scene.
        royal_roach_id: EntityId,
    },
    /// Free-form message for the player.
    Notification {
        /// Text to show.
        message: String,
    },
}

impl Event {
    /// Type key of [`Event::NotEnoughResources`].
    pub const NOT_ENOUGH_RESOURCES: &'static str = "NotEnoughResourcesEvent";
    /// Type key of [`Event::UnitNotUnlocked`].
    pub const UNIT_NOT_UNLOCKED: &'static str = "UnitNotUnlockedEvent";
    /// Type key of [`Event::SceneCompletion`].
    pub const SCENE_COMPLETION: &'static str = "SceneCompletionEvent";
    /// Type key of [`Event::Notification`].
    pub const NOTIFICATION: &'static str = "NotificationEvent";

    /// The key subscribers register under.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::NotEnoughResources { .. } => Self::NOT_ENOUGH_RESOURCES,
            Self::UnitNotUnlocked { .. } => Self::UNIT_NOT_UNLOCKED,
            Self::SceneCompletion { .. } => Self::SCENE_COMPLETION,
            Self::Notification { .. } => Self::NOTIFICATION,
        }
    }

    /// Shorthand for a [`Event::Notification`].
    #[must_use]
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification {
            message: message.into(),
        }
    }
}

/// Errors raised while publishing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A publish was nested deeper than the bus allows; it was dropped.
    #[error("event '{event_type}' dropped at publish depth {depth}")]
    DepthExceeded {
        /// Type key of the dropped event.
        event_type: &'static str,
        /// Depth at which it was dropped.
        depth: usize,
    },
}

/// Subscriber callback. Gets the bus so it can publish in turn.
pub type Handler = Rc<dyn Fn(&Event, &mut EventBus)>;

/// Default nesting limit for re-entrant publishes.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// String-keyed synchronous event bus.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use colony_core::events::{Event, EventBus};
///
/// let mut bus = EventBus::new();
/// let seen = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&seen);
/// bus.subscribe(Event::NOTIFICATION, move |_, _| counter.set(counter.get() + 1));
///
/// bus.publish(&Event::notification("hello")).unwrap();
/// assert_eq!(seen.get(), 1);
/// ```
pub struct EventBus {
    subscribers: HashMap<String, Vec<Handler>>,
    depth: usize,
    max_depth: usize,
}

impl EventBus {
    /// Create a bus with the default depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create a bus with a custom depth limit.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            subscribers: HashMap::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Append a handler for an event type.
    pub fn subscribe<F>(&mut self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&Event, &mut EventBus) + 'static,
    {
        let event_type = event_type.into();
        tracing::trace!(event_type = %event_type, "event subscribed");
        self.subscribers
            .entry(event_type)
            .or_default()
            .push(Rc::new(handler));
    }

    /// Remove every handler for an event type.
    ///
    /// Returns `false` if there were none.
    pub fn unsubscribe(&mut self, event_type: &str) -> bool {
        let removed = self.subscribers.remove(event_type).is_some();
        if !removed {
            tracing::debug!(event_type, "no subscribers to remove");
        }
        removed
    }

    /// Number of handlers registered for an event type.
    #[must_use]
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers.get(event_type).map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's type.
    ///
    /// Handlers registered while this publish is running are not called for
    /// this event. Returns the number of handlers invoked.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DepthExceeded`] when called from handlers nested
    /// deeper than the limit. The event is not delivered.
    pub fn publish(&mut self, event: &Event) -> Result<usize, EventError> {
        let event_type = event.event_type();
        if self.depth >= self.max_depth {
            tracing::warn!(event_type, depth = self.depth, "event publish depth exceeded");
            return Err(EventError::DepthExceeded {
                event_type,
                depth: self.depth,
            });
        }

        let handlers = self
            .subscribers
            .get(event_type)
            .cloned()
            .unwrap_or_default();
        tracing::trace!(event_type, handlers = handlers.len(), "event published");

        self.depth += 1;
        for handler in &handlers {
            handler(event, self);
        }
        self.depth -= 1;

        Ok(handlers.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self
            .subscribers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        types.sort_unstable();
        f.debug_struct("EventBus")
            .field("subscribers", &types)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
