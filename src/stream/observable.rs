use super::observer::{Event, Fault, Observer};
use super::ops::Operator;
use super::serialize::SerializingObserver;
use super::subscription::Subscription;
use super::transform::Transformer;
use log::debug;

use std::fmt::Debug;
use std::sync::Arc;

pub trait StreamType: Send + Sync + Clone + Debug + 'static {}

impl<T> StreamType for T where T: Send + Sync + Clone + Debug + 'static {}

type ProducerFn<T> = dyn Fn(Arc<dyn Observer<T>>, Subscription) + Send + Sync;

/// A lazy, reusable description of how to produce a sequence of events
///
/// A stream holds no events of its own, only a producer function. Every
/// subscribe call runs an independent execution of that producer, which may
/// emit entirely on the subscribing thread before returning or keep emitting
/// from threads it spawns. Cloning a stream clones the description, not any
/// execution.
///
/// # Example
/// ```
/// use ripple::stream::observable::Stream;
/// use ripple::stream::observer::ObserverBuilder;
/// use ripple::stream::ops::*;
/// use std::sync::{Arc, Mutex};
///
/// let collected = Arc::new(Mutex::new(Vec::new()));
/// let capture = collected.clone();
/// Stream::range(0, 3)
///   .map(|x| x * 10)
///   .subscribe(
///     ObserverBuilder::new()
///       .next(move |x| capture.lock().unwrap().push(x))
///       .build(),
///   );
/// assert_eq!(*collected.lock().unwrap(), [0, 10, 20]);
/// ```
#[derive(Clone)]
pub struct Stream<T>
where
  T: StreamType,
{
  producer: Arc<ProducerFn<T>>,
}

impl<T> Stream<T>
where
  T: StreamType,
{
  /// Constructs a stream from a custom producer function
  ///
  /// The producer receives the subscribing observer and the subscription for
  /// this execution; it runs once per subscribe call. A producer that panics
  /// before returning surfaces that panic to the subscribe caller, never
  /// through the observer.
  pub fn new<F>(producer: F) -> Self
  where
    F: Fn(Arc<dyn Observer<T>>, Subscription) + Send + Sync + 'static,
  {
    Stream {
      producer: Arc::new(producer),
    }
  }

  /// Constructs a stream of a constant list of values
  ///
  /// Each subscription emits every value in order on the subscribing thread
  /// and then completes.
  pub fn of(values: Vec<T>) -> Self {
    Stream::new(move |observer, _subscription| {
      for value in values.iter() {
        observer.on_next(value.clone());
      }
      observer.on_complete();
    })
  }

  /// Begins one execution of the stream, delivering events through the
  /// terminal-suppression guard
  ///
  /// Once a terminal event has been delivered the subscription is marked
  /// cancelled and every further callback is suppressed by the delivery
  /// path - the producer is never trusted to stop on its own.
  pub fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
    self.subscribe_with(observer, true)
  }

  /// Begins one execution of the stream without the terminal-suppression
  /// guard
  ///
  /// Identical signature to [subscribe](Stream::subscribe), but events a
  /// producer pushes after a terminal event - including a second terminal -
  /// reach the observer unchanged, and the subscription is not cancelled on
  /// completion.
  pub fn subscribe_unsafe(
    &self,
    observer: Arc<dyn Observer<T>>,
  ) -> Subscription {
    self.subscribe_with(observer, false)
  }

  fn subscribe_with(
    &self,
    observer: Arc<dyn Observer<T>>,
    safe: bool,
  ) -> Subscription {
    let subscription = Subscription::new();
    let observer: Arc<dyn Observer<T>> = if safe {
      Arc::new(GuardObserver::new(observer, subscription.clone()))
    } else {
      observer
    };
    (self.producer)(observer, subscription.clone());
    subscription
  }

  /// Inserts an observer-level transformation without altering the producer
  ///
  /// The returned stream's producer applies `operator` to the subscribing
  /// observer and feeds the operator-produced observer to the original
  /// producer. The subscription is threaded through unchanged so the whole
  /// chain shares one cancellation flag.
  ///
  /// # Example
  /// ```
  /// use ripple::stream::observable::Stream;
  /// use ripple::stream::observer::ObserverBuilder;
  /// use ripple::stream::ops::MapOperator;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let collected = Arc::new(Mutex::new(Vec::new()));
  /// let capture = collected.clone();
  /// Stream::of(vec![1, 2, 3])
  ///   .lift(MapOperator::new(|x: i64| x + 1))
  ///   .subscribe(
  ///     ObserverBuilder::new()
  ///       .next(move |x| capture.lock().unwrap().push(x))
  ///       .build(),
  ///   );
  /// assert_eq!(*collected.lock().unwrap(), [2, 3, 4]);
  /// ```
  pub fn lift<R, O>(&self, operator: O) -> Stream<R>
  where
    R: StreamType,
    O: Operator<T, R> + 'static,
  {
    let producer = self.producer.clone();
    let operator = Arc::new(operator);
    Stream::new(move |observer, subscription| {
      let upstream = operator.apply(observer, subscription.clone());
      (producer)(upstream, subscription);
    })
  }

  /// Applies a whole-stream transformation
  ///
  /// `compose` packages a reusable, named combination of operators behind a
  /// single object; see [Transformer](super::transform::Transformer).
  pub fn compose<R, X>(&self, transformer: &X) -> Stream<R>
  where
    R: StreamType,
    X: Transformer<T, R> + ?Sized,
  {
    transformer.transform(self.clone())
  }

  /// Wraps delivery in a mutual-exclusion decorator
  ///
  /// Downstream of `serialize` no observer callback ever runs concurrently
  /// with another, even when the producer emits from several threads, and
  /// nothing is forwarded after the first terminal event regardless of
  /// whether the subscription was safe or unsafe.
  pub fn serialize(&self) -> Stream<T> {
    let producer = self.producer.clone();
    Stream::new(move |observer, subscription| {
      let serialized = Arc::new(SerializingObserver::new(observer));
      (producer)(serialized, subscription);
    })
  }
}

impl Stream<i64> {
  /// Constructs a stream counting `count` integers up from `start`
  ///
  /// # Example
  /// ```
  /// use ripple::stream::observable::Stream;
  /// use ripple::stream::observer::ObserverBuilder;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let collected = Arc::new(Mutex::new(Vec::new()));
  /// let capture = collected.clone();
  /// Stream::range(5, 3).subscribe(
  ///   ObserverBuilder::new()
  ///     .next(move |x| capture.lock().unwrap().push(x))
  ///     .build(),
  /// );
  /// assert_eq!(*collected.lock().unwrap(), [5, 6, 7]);
  /// ```
  pub fn range(start: i64, count: usize) -> Stream<i64> {
    Stream::new(move |observer, _subscription| {
      for offset in 0..count {
        observer.on_next(start + offset as i64);
      }
      observer.on_complete();
    })
  }
}

/// Terminal-suppression decorator applied by the safe subscription path.
/// Checks the subscription before every delivery and cancels it after
/// forwarding a terminal event, so misbehaving producers cannot reach the
/// observer past the first terminal.
struct GuardObserver<T>
where
  T: StreamType,
{
  downstream: Arc<dyn Observer<T>>,
  subscription: Subscription,
}

impl<T> GuardObserver<T>
where
  T: StreamType,
{
  fn new(downstream: Arc<dyn Observer<T>>, subscription: Subscription) -> Self {
    GuardObserver {
      downstream,
      subscription,
    }
  }

  fn deliver(&self, event: Event<T>) {
    if self.subscription.cancelled() {
      debug!("suppressing delivery on cancelled subscription");
      return;
    }
    match event {
      Event::Next(value) => self.downstream.on_next(value),
      Event::Error(fault) => {
        self.downstream.on_error(fault);
        self.subscription.cancel();
      }
      Event::Complete => {
        self.downstream.on_complete();
        self.subscription.cancel();
      }
    }
  }
}

impl<T> Observer<T> for GuardObserver<T>
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
