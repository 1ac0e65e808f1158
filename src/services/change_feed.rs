//! Change feed contract: subscribe-by-filter delivery of row changes.

use tokio::sync::mpsc;

use crate::types::change::{ChangeEvent, ChangeFilter, SubscriptionHandle};
use crate::types::errors::FeedError;

/// An active subscription. Events arrive in the order the store emitted them.
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
}

/// Trait defining the change feed operations.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, filter: ChangeFilter) -> Result<Subscription, FeedError>;

    /// Stops delivery for `handle`. Unknown handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}
