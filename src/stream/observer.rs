use super::observable::StreamType;
use log::error;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The error payload carried by [Observer::on_error].
pub type Fault = Arc<dyn Error + Send + Sync>;

/// A single occurrence in an event sequence. At most one terminal event
/// ([Event::Error] or [Event::Complete]) is meaningful per subscription;
/// anything a producer pushes after that only survives an unsafe,
/// unserialized delivery path.
#[derive(Clone, Debug)]
pub enum Event<T>
where
  T: StreamType,
{
  Next(T),
  Error(Fault),
  Complete,
}

/// Faults produced by the stream machinery itself.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamError {
  /// An operator stage panicked while transforming a value. Carries the
  /// panic message.
  Operator(String),
}

impl Display for StreamError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      StreamError::Operator(message) => {
        write!(f, "operator stage panicked: {}", message)
      }
    }
  }
}

impl Error for StreamError {}

/// The sink side of a stream: a source pushes events into these three
/// callbacks. Observers carry no ordering or exclusion guarantee of their
/// own - a safe subscription adds terminal suppression and
/// [serialize](super::observable::Stream::serialize) adds mutual exclusion.
pub trait Observer<T>: Send + Sync
where
  T: StreamType,
{
  fn on_next(&self, value: T);
  fn on_error(&self, fault: Fault);
  fn on_complete(&self);
}

type NextFn<T> = dyn Fn(T) + Send + Sync;
type ErrorFn = dyn Fn(Fault) + Send + Sync;
type CompleteFn = dyn Fn() + Send + Sync;

/// Builder assembling an [Observer] out of individual callback closures
///
/// Callbacks are optional: a missing `next` or `complete` callback ignores
/// the event, a missing `error` callback logs the fault so that failures are
/// never swallowed silently.
///
/// # Example
/// ```
/// use ripple::stream::observable::Stream;
/// use ripple::stream::observer::ObserverBuilder;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
///
/// let sum = Arc::new(AtomicI64::new(0));
/// let capture = sum.clone();
/// Stream::of(vec![1, 2, 3]).subscribe(
///   ObserverBuilder::new()
///     .next(move |x| {
///       capture.fetch_add(x, Ordering::Relaxed);
///     })
///     .build(),
/// );
/// assert_eq!(sum.load(Ordering::Relaxed), 6);
/// ```
pub struct ObserverBuilder<T>
where
  T: StreamType,
{
  next: Option<Arc<NextFn<T>>>,
  error: Option<Arc<ErrorFn>>,
  complete: Option<Arc<CompleteFn>>,
}

impl<T> Default for ObserverBuilder<T>
where
  T: StreamType,
{
  fn default() -> Self {
    ObserverBuilder {
      next: None,
      error: None,
      complete: None,
    }
  }
}

impl<T> ObserverBuilder<T>
where
  T: StreamType,
{
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next<F>(mut self, func: F) -> Self
  where
    F: Fn(T) + Send + Sync + 'static,
  {
    self.next = Some(Arc::new(func));
    self
  }

  pub fn error<F>(mut self, func: F) -> Self
  where
    F: Fn(Fault) + Send + Sync + 'static,
  {
    self.error = Some(Arc::new(func));
    self
  }

  pub fn complete<F>(mut self, func: F) -> Self
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.complete = Some(Arc::new(func));
    self
  }

  pub fn build(self) -> Arc<FnObserver<T>> {
    Arc::new(FnObserver {
      next: self.next,
      error: self.error,
      complete: self.complete,
    })
  }
}

/// Observer backed by the closures collected by [ObserverBuilder].
pub struct FnObserver<T>
where
  T: StreamType,
{
  next: Option<Arc<NextFn<T>>>,
  error: Option<Arc<ErrorFn>>,
  complete: Option<Arc<CompleteFn>>,
}

impl<T> Observer<T> for FnObserver<T>
where
  T: StreamType,
{
  fn on_next(&self, value: T) {
    if let Some(next) = &self.next {
      next(value);
    }
  }

  fn on_error(&self, fault: Fault) {
    match &self.error {
      Some(handler) => handler(fault),
      None => error!("unhandled stream fault: {}", fault),
    }
  }

  fn on_complete(&self) {
    if let Some(complete) = &self.complete {
      complete();
    }
  }
}


#[cfg(test)]
mod test {
  use super::*;

  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn builder_callbacks_test() {
    let nexts = Arc::new(AtomicUsize::new(0));
    let completes = Arc::new(AtomicUsize::new(0));
    let next_capture = nexts.clone();
    let complete_capture = completes.clone();
    let observer = ObserverBuilder::new()
      .next(move |_: i64| {
        next_capture.fetch_add(1, Ordering::Relaxed);
      })
      .complete(move || {
        complete_capture.fetch_add(1, Ordering::Relaxed);
      })
      .build();
    observer.on_next(1);
    observer.on_next(2);
    observer.on_complete();
    assert_eq!(nexts.load(Ordering::Relaxed), 2);
    assert_eq!(completes.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn builder_error_callback_test() {
    let faults = Arc::new(AtomicUsize::new(0));
    let capture = faults.clone();
    let observer = ObserverBuilder::<i64>::new()
      .error(move |fault| {
        assert!(fault.to_string().contains("panicked"));
        capture.fetch_add(1, Ordering::Relaxed);
      })
      .build();
    observer.on_error(Arc::new(StreamError::Operator("test".to_owned())));
    assert_eq!(faults.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn empty_observer_ignores_events_test() {
    let observer = ObserverBuilder::<i64>::new().build();
    observer.on_next(1);
    observer.on_complete();
  }

  #[test]
  fn stream_error_display_test() {
    let fault = StreamError::Operator("divide by zero".to_owned());
    assert_eq!(
      fault.to_string(),
      "operator stage panicked: divide by zero"
    );
  }
}
