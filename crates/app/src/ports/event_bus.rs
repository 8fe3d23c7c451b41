//! Event bus port: publish/subscribe for hub events.

use std::future::Future;

use homeguard_domain::error::HomeGuardError;
use homeguard_domain::event::Event;

/// Publishes hub events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HomeGuardError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HomeGuardError>> + Send {
        (**self).publish(event)
    }
}
