use super::observable::{Stream, StreamType};
use super::observer::{Fault, Observer, StreamError};
use super::subscription::Subscription;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An observer-to-observer transformation, the unit of composition for
/// [lift](Stream::lift)
///
/// `apply` runs once per subscription: it adapts the downstream observer
/// into an upstream-compatible one, creating any per-subscription state
/// fresh. The subscription passed in is the one shared by the whole chain;
/// operator-produced observers consult it before forwarding so that the
/// safe-subscribe suppression contract holds through lifted stages.
pub trait Operator<T, R>: Send + Sync
where
  T: StreamType,
  R: StreamType,
{
  fn apply(
    &self,
    downstream: Arc<dyn Observer<R>>,
    subscription: Subscription,
  ) -> Arc<dyn Observer<T>>;
}

/// Forwarding half shared by the built-in operator observers. Checks the
/// chain's subscription before every delivery, forwards each terminal at
/// most once, and routes transform panics downstream as faults.
pub(super) struct Downstream<T>
where
  T: StreamType,
{
  target: Arc<dyn Observer<T>>,
  subscription: Subscription,
  terminated: AtomicBool,
  faulted: AtomicBool,
}

impl<T> Downstream<T>
where
  T: StreamType,
{
  pub(super) fn new(
    target: Arc<dyn Observer<T>>,
    subscription: Subscription,
  ) -> Self {
    Downstream {
      target,
      subscription,
      terminated: AtomicBool::new(false),
      faulted: AtomicBool::new(false),
    }
  }

  pub(super) fn active(&self) -> bool {
    !self.subscription.cancelled() && !self.faulted.load(Ordering::Relaxed)
  }

  pub(super) fn next(&self, value: T) {
    if !self.active() {
      return;
    }
    self.target.on_next(value);
  }

  pub(super) fn error(&self, fault: Fault) {
    if self.subscription.cancelled() {
      return;
    }
    if !self.terminated.swap(true, Ordering::Relaxed) {
      self.target.on_error(fault);
    }
  }

  pub(super) fn complete(&self) {
    if self.subscription.cancelled() {
      return;
    }
    if !self.terminated.swap(true, Ordering::Relaxed) {
      self.target.on_complete();
    }
  }

  /// Completes downstream and cancels the chain, for operators that end the
  /// sequence early.
  pub(super) fn finish(&self) {
    self.complete();
    self.subscription.cancel();
  }

  /// Routes a panic payload out of a transform stage as a terminal fault.
  /// No further values are forwarded through this stage afterward.
  pub(super) fn fault(&self, payload: Box<dyn Any + Send>) {
    self.faulted.store(true, Ordering::Relaxed);
    self.error(Arc::new(StreamError::Operator(panic_message(payload))));
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_owned()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "opaque panic payload".to_owned()
  }
}

/// Operator mapping each value through a pure function.
pub struct MapOperator<A, B>
where
  A: StreamType,
  B: StreamType,
{
  func: Arc<dyn Fn(A) -> B + Send + Sync>,
}

impl<A, B> MapOperator<A, B>
where
  A: StreamType,
  B: StreamType,
{
  pub fn new<F>(func: F) -> Self
  where
    F: Fn(A) -> B + Send + Sync + 'static,
  {
    MapOperator {
      func: Arc::new(func),
    }
  }
}

impl<A, B> Operator<A, B> for MapOperator<A, B>
where
  A: StreamType,
  B: StreamType,
{
  fn apply(
    &self,
    downstream: Arc<dyn Observer<B>>,
    subscription: Subscription,
  ) -> Arc<dyn Observer<A>> {
    Arc::new(MapObserver {
      downstream: Downstream::new(downstream, subscription),
      func: self.func.clone(),
    })
  }
}

struct MapObserver<A, B>
where
  A: StreamType,
  B: StreamType,
{
  downstream: Downstream<B>,
  func: Arc<dyn Fn(A) -> B + Send + Sync>,
}

impl<A, B> Observer<A> for MapObserver<A, B>
where
  A: StreamType,
  B: StreamType,
{
  fn on_next(&self, value: A) {
    if !self.downstream.active() {
      return;
    }
    let func = self.func.clone();
    match catch_unwind(AssertUnwindSafe(move || func(value))) {
      Ok(mapped) => self.downstream.next(mapped),
      Err(payload) => self.downstream.fault(payload),
    }
  }

  fn on_error(&self, fault: Fault) {
    self.downstream.error(fault);
  }

  fn on_complete(&self) {
    self.downstream.complete();
  }
}

pub trait Map<A, B>
where
  A: StreamType,
  B: StreamType,
{
  /// Attaches a mapping operator through [lift](Stream::lift)
  ///
  /// `map` transforms one stream type into another. A mapping function that
  /// panics routes the failure into `on_error` downstream instead of
  /// unwinding through the producer.
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
  ///   .map(|x| format!("value_{}", x))
  ///   .subscribe(
  ///     ObserverBuilder::new()
  ///       .next(move |x| capture.lock().unwrap().push(x))
  ///       .build(),
  ///   );
  /// assert_eq!(*collected.lock().unwrap(), ["value_0", "value_1", "value_2"]);
  /// ```
  fn map<F>(&self, func: F) -> Stream<B>
  where
    F: Fn(A) -> B + Send + Sync + 'static;
}

impl<A, B> Map<A, B> for Stream<A>
where
  A: StreamType,
  B: StreamType,
{
  fn map<F>(&self, func: F) -> Stream<B>
  where
    F: Fn(A) -> B + Send + Sync + 'static,
  {
    self.lift(MapOperator::new(func))
  }
}

/// Operator dropping values that fail a predicate.
pub struct FilterOperator<T>
where
  T: StreamType,
{
  predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> FilterOperator<T>
where
  T: StreamType,
{
  pub fn new<F>(predicate: F) -> Self
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    FilterOperator {
      predicate: Arc::new(predicate),
    }
  }
}

impl<T> Operator<T, T> for FilterOperator<T>
where
  T: StreamType,
{
  fn apply(
    &self,
    downstream: Arc<dyn Observer<T>>,
    subscription: Subscription,
  ) -> Arc<dyn Observer<T>> {
    Arc::new(FilterObserver {
      downstream: Downstream::new(downstream, subscription),
      predicate: self.predicate.clone(),
    })
  }
}

struct FilterObserver<T>
where
  T: StreamType,
{
  downstream: Downstream<T>,
  predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Observer<T> for FilterObserver<T>
where
  T: StreamType,
{
  fn on_next(&self, value: T) {
    if !self.downstream.active() {
      return;
    }
    match catch_unwind(AssertUnwindSafe(|| (self.predicate)(&value))) {
      Ok(true) => self.downstream.next(value),
      Ok(false) => (),
      Err(payload) => self.downstream.fault(payload),
    }
  }

  fn on_error(&self, fault: Fault) {
    self.downstream.error(fault);
  }

  fn on_complete(&self) {
    self.downstream.complete();
  }
}

pub trait Filter<T>
where
  T: StreamType,
{
  /// Attaches a filter operator through [lift](Stream::lift)
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
  /// Stream::of(vec![1, 2, 3, 4, 5, 6])
  ///   .filter(|x| x % 2 == 0)
  ///   .subscribe(
  ///     ObserverBuilder::new()
  ///       .next(move |x| capture.lock().unwrap().push(x))
  ///       .build(),
  ///   );
  /// assert_eq!(*collected.lock().unwrap(), [2, 4, 6]);
  /// ```
  fn filter<F>(&self, predicate: F) -> Stream<T>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static;
}

impl<T> Filter<T> for Stream<T>
where
  T: StreamType,
{
  fn filter<F>(&self, predicate: F) -> Stream<T>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    self.lift(FilterOperator::new(predicate))
  }
}

/// Operator folding values into a running state, emitting each state.
pub struct ScanOperator<A, B>
where
  A: StreamType,
  B: StreamType,
{
  seed: B,
  fold: Arc<dyn Fn(B, A) -> B + Send + Sync>,
}

impl<A, B> ScanOperator<A, B>
where
  A: StreamType,
  B: StreamType,
{
  pub fn new<F>(seed: B, fold: F) -> Self
  where
    F: Fn(B, A) -> B + Send + Sync + 'static,
  {
    ScanOperator {
      seed,
      fold: Arc::new(fold),
    }
  }
}

impl<A, B> Operator<A, B> for ScanOperator<A, B>
where
  A: StreamType,
  B: StreamType,
{
  fn apply(
    &self,
    downstream: Arc<dyn Observer<B>>,
    subscription: Subscription,
  ) -> Arc<dyn Observer<A>> {
    let downstream = Downstream::new(downstream, subscription);
    // The seed is the first emission of every subscription.
    downstream.next(self.seed.clone());
    Arc::new(ScanObserver {
      downstream,
      state: Mutex::new(self.seed.clone()),
      fold: self.fold.clone(),
    })
  }
}

struct ScanObserver<A, B>
where
  A: StreamType,
  B: StreamType,
{
  downstream: Downstream<B>,
  state: Mutex<B>,
  fold: Arc<dyn Fn(B, A) -> B + Send + Sync>,
}

impl<A, B> Observer<A> for ScanObserver<A, B>
where
  A: StreamType,
  B: StreamType,
{
  fn on_next(&self, value: A) {
    if !self.downstream.active() {
      return;
    }
    let current = self.state.lock().unwrap().clone();
    let fold = self.fold.clone();
    match catch_unwind(AssertUnwindSafe(move || fold(current, value))) {
      Ok(folded) => {
        *self.state.lock().unwrap() = folded.clone();
        self.downstream.next(folded);
      }
      Err(payload) => self.downstream.fault(payload),
    }
  }

  fn on_error(&self, fault: Fault) {
    self.downstream.error(fault);
  }

  fn on_complete(&self) {
    self.downstream.complete();
  }
}

pub trait Scan<A, B>
where
  A: StreamType,
  B: StreamType,
{
  /// Attaches a folding operator through [lift](Stream::lift)
  ///
  /// `scan` emits the seed at subscription time, then one new state per
  /// incoming value, computed from the previous state and the value. Each
  /// subscription folds from a fresh copy of the seed.
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
  /// Stream::of(vec![1, 2, 3])
  ///   .scan(0, |sum, x| sum + x)
  ///   .subscribe(
  ///     ObserverBuilder::new()
  ///       .next(move |x| capture.lock().unwrap().push(x))
  ///       .build(),
  ///   );
  /// assert_eq!(*collected.lock().unwrap(), [0, 1, 3, 6]);
  /// ```
  fn scan<F>(&self, seed: B, fold: F) -> Stream<B>
  where
    F: Fn(B, A) -> B + Send + Sync + 'static;
}

impl<A, B> Scan<A, B> for Stream<A>
where
  A: StreamType,
  B: StreamType,
{
  fn scan<F>(&self, seed: B, fold: F) -> Stream<B>
  where
    F: Fn(B, A) -> B + Send + Sync + 'static,
  {
    self.lift(ScanOperator::new(seed, fold))
  }
}

/// Operator ending the sequence after a fixed number of values.
pub struct TakeOperator {
  count: usize,
}

impl TakeOperator {
  pub fn new(count: usize) -> Self {
    TakeOperator { count }
  }
}

impl<T> Operator<T, T> for TakeOperator
where
  T: StreamType,
{
  fn apply(
    &self,
    downstream: Arc<dyn Observer<T>>,
    subscription: Subscription,
  ) -> Arc<dyn Observer<T>> {
    let downstream = Downstream::new(downstream, subscription);
    if self.count == 0 {
      downstream.finish();
    }
    Arc::new(TakeObserver {
      downstream,
      count: self.count,
      seen: AtomicUsize::new(0),
    })
  }
}

struct TakeObserver<T>
where
  T: StreamType,
{
  downstream: Downstream<T>,
  count: usize,
  seen: AtomicUsize,
}

impl<T> Observer<T> for TakeObserver<T>
where
  T: StreamType,
{
  fn on_next(&self, value: T) {
    if !self.downstream.active() {
      return;
    }
    let seen = self.seen.fetch_add(1, Ordering::Relaxed);
    if seen < self.count {
      self.downstream.next(value);
    }
    if seen + 1 >= self.count {
      self.downstream.finish();
    }
  }

  fn on_error(&self, fault: Fault) {
    self.downstream.error(fault);
  }

  fn on_complete(&self) {
    self.downstream.complete();
  }
}

pub trait Take<T>
where
  T: StreamType,
{
  /// Attaches a take operator through [lift](Stream::lift)
  ///
  /// After `count` values the operator completes downstream and cancels the
  /// chain's subscription, so remaining upstream emissions are suppressed.
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
  /// Stream::of(vec![1, 2, 3, 4, 5, 6])
  ///   .take(3)
  ///   .subscribe(
  ///     ObserverBuilder::new()
  ///       .next(move |x| capture.lock().unwrap().push(x))
  ///       .build(),
  ///   );
  /// assert_eq!(*collected.lock().unwrap(), [1, 2, 3]);
  /// ```
  fn take(&self, count: usize) -> Stream<T>;
}

impl<T> Take<T> for Stream<T>
where
  T: StreamType,
{
  fn take(&self, count: usize) -> Stream<T> {
    self.lift(TakeOperator::new(count))
  }
}

/// Operator running a side effect on each value before forwarding it.
pub struct TapOperator<T>
where
  T: StreamType,
{
  func: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> TapOperator<T>
where
  T: StreamType,
{
  pub fn new<F>(func: F) -> Self
  where
    F: Fn(T) + Send + Sync + 'static,
  {
    TapOperator {
      func: Arc::new(func),
    }
  }
}

impl<T> Operator<T, T> for TapOperator<T>
where
  T: StreamType,
{
  fn apply(
    &self,
    downstream: Arc<dyn Observer<T>>,
    subscription: Subscription,
  ) -> Arc<dyn Observer<T>> {
    Arc::new(TapObserver {
      downstream: Downstream::new(downstream, subscription),
      func: self.func.clone(),
    })
  }
}

struct TapObserver<T>
where
  T: StreamType,
{
  downstream: Downstream<T>,
  func: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Observer<T> for TapObserver<T>
where
  T: StreamType,
{
  fn on_next(&self, value: T) {
    if !self.downstream.active() {
      return;
    }
    let func = self.func.clone();
    let tapped = value.clone();
    match catch_unwind(AssertUnwindSafe(move || func(tapped))) {
      Ok(()) => self.downstream.next(value),
      Err(payload) => self.downstream.fault(payload),
    }
  }

  fn on_error(&self, fault: Fault) {
    self.downstream.error(fault);
  }

  fn on_complete(&self) {
    self.downstream.complete();
  }
}

pub trait Tap<T>
where
  T: StreamType,
{
  /// Attaches a tap operator through [lift](Stream::lift)
  ///
  /// `tap` runs code against the event sequence without affecting what the
  /// downstream observers receive.
  fn tap<F>(&self, func: F) -> Stream<T>
  where
    F: Fn(T) + Send + Sync + 'static;
}

impl<T> Tap<T> for Stream<T>
where
  T: StreamType,
{
  fn tap<F>(&self, func: F) -> Stream<T>
  where
    F: Fn(T) + Send + Sync + 'static,
  {
    self.lift(TapOperator::new(func))
  }
}
