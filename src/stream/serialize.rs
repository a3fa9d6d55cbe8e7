use super::observable::StreamType;
use super::observer::{Event, Fault, Observer};
use crate::sync::spinlock::SpinLock;
use log::warn;

use std::sync::Arc;

struct DeliveryState {
  terminated: bool,
}

/// Delivery decorator applied by [serialize](super::observable::Stream::serialize)
///
/// Every callback acquires the decorator's lock before forwarding and holds
/// it until the downstream call returns, so concurrent producer threads
/// never overlap invocations. The first terminal event flips the terminated
/// flag under the same lock; everything after it is dropped, independent of
/// whether the subscription path was safe or unsafe. The lock is owned by
/// this instance and scoped to one subscription.
pub(super) struct SerializingObserver<T>
where
  T: StreamType,
{
  downstream: Arc<dyn Observer<T>>,
  state: SpinLock<DeliveryState>,
}

impl<T> SerializingObserver<T>
where
  T: StreamType,
{
  pub(super) fn new(downstream: Arc<dyn Observer<T>>) -> Self {
    SerializingObserver {
      downstream,
      state: SpinLock::new(DeliveryState { terminated: false }),
    }
  }

  fn deliver(&self, event: Event<T>) {
    let mut guard = self.state.lock();
    if guard.terminated {
      warn!("dropping event emitted after a terminal event");
      return;
    }
    match event {
      Event::Next(value) => self.downstream.on_next(value),
      Event::Error(fault) => {
        guard.terminated = true;
        self.downstream.on_error(fault);
      }
      Event::Complete => {
        guard.terminated = true;
        self.downstream.on_complete();
      }
    }
  }
}

impl<T> Observer<T> for SerializingObserver<T>
where
  T: StreamType,
{
  fn on_next(&self, value: T) {
    self.deliver(Event::Next(value));
  }

  fn on_error(&self, fault: Fault) {
    self.deliver(Event::Error(fault));
  }

  fn on_complete(&self) {
    self.deliver(Event::Complete);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::stream::observable::testing::leaky_source;
  use crate::stream::observer::testing::RecordingObserver;
  use crate::stream::observer::StreamError;

  #[test]
  fn drops_events_after_complete_test() {
    let observer = RecordingObserver::new();
    let serializing = SerializingObserver::new(
      observer.clone() as Arc<dyn Observer<i64>>
    );
    serializing.on_next(1);
    serializing.on_complete();
    serializing.on_next(2);
    serializing.on_complete();
    assert_eq!(observer.values(), [1i64]);
    assert_eq!(observer.completions(), 1);
  }

  #[test]
  fn drops_events_after_error_test() {
    let observer = RecordingObserver::new();
    let serializing = SerializingObserver::new(
      observer.clone() as Arc<dyn Observer<i64>>
    );
    serializing.on_next(1);
    serializing
      .on_error(Arc::new(StreamError::Operator("failed".to_owned())));
    serializing.on_next(2);
    serializing.on_complete();
    assert_eq!(observer.values(), [1i64]);
    assert_eq!(observer.faults(), 1);
    assert_eq!(observer.completions(), 0);
  }

  #[test]
  fn serialized_unsafe_subscription_test() {
    let observer = RecordingObserver::new();
    let subscription =
      leaky_source().serialize().subscribe_unsafe(observer.clone());
    assert_eq!(observer.values(), [1, 2]);
    assert_eq!(observer.terminals(), 1);
    assert!(subscription.active());
  }
}
