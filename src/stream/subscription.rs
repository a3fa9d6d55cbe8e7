use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation handle tying one stream execution to the current scope
///
/// A subscription is created by each subscribe call and shared between the
/// consumer and the delivery path: the consumer may cancel it explicitly,
/// and a safe subscription marks it cancelled once a terminal event has been
/// delivered. Cloning is cheap and every clone refers to the same flag.
///
/// # Example
/// ```
/// use ripple::stream::observable::Stream;
/// use ripple::stream::observer::ObserverBuilder;
///
/// let subscription = Stream::of(vec![1, 2, 3])
///   .subscribe(ObserverBuilder::new().next(|_| {}).build());
/// assert!(subscription.cancelled());
/// ```
#[derive(Clone)]
pub struct Subscription {
  cancelled: Arc<AtomicBool>,
}

impl Subscription {
  pub(super) fn new() -> Self {
    Subscription {
      cancelled: Arc::new(AtomicBool::new(false)),
    }
  }

  /// Marks the subscription cancelled, preventing any further deliveries on
  /// paths that check the flag. Cancelling twice is a no-op.
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Relaxed);
  }

  pub fn cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Relaxed)
  }

  pub fn active(&self) -> bool {
    !self.cancelled()
  }
}
