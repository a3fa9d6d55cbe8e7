use super::observable::{Stream, StreamType};
use super::ops::{Filter, Map, Scan};

/// A whole-stream transformation, the unit of composition for
/// [compose](Stream::compose)
///
/// Transformers are pure: they may capture configuration fixed at
/// construction time but must not hold subscription-scoped state, since the
/// stream they produce is reusable across independent subscriptions. Any
/// per-subscription state belongs inside the composed operator chain, which
/// creates it fresh on every subscribe.
///
/// Bare closures work as transformers:
/// ```
/// use ripple::stream::observable::Stream;
/// use ripple::stream::observer::ObserverBuilder;
/// use ripple::stream::ops::*;
/// use std::sync::{Arc, Mutex};
///
/// let collected = Arc::new(Mutex::new(Vec::new()));
/// let capture = collected.clone();
/// Stream::of(vec![1, 2, 3])
///   .compose(&|stream: Stream<i64>| stream.map(|x| x * 2))
///   .subscribe(
///     ObserverBuilder::new()
///       .next(move |x| capture.lock().unwrap().push(x))
///       .build(),
///   );
/// assert_eq!(*collected.lock().unwrap(), [2, 4, 6]);
/// ```
pub trait Transformer<T, R>: Send + Sync
where
  T: StreamType,
  R: StreamType,
{
  fn transform(&self, stream: Stream<T>) -> Stream<R>;
}

impl<T, R, F> Transformer<T, R> for F
where
  T: StreamType,
  R: StreamType,
  F: Fn(Stream<T>) -> Stream<R> + Send + Sync,
{
  fn transform(&self, stream: Stream<T>) -> Stream<R> {
    self(stream)
  }
}

/// Running-sum accumulator folded by [RunningAverage]. Replaced wholesale on
/// each step; `count == 0` only ever holds for the seed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Average {
  pub sum: i64,
  pub count: i64,
}

/// Transformer emitting the running mean of its inputs
///
/// Inputs at or above the configured threshold are excluded from both the
/// running sum and the output; with no threshold configured every input
/// counts. Each surviving input produces one output: the mean of all inputs
/// seen so far, computed in floating point. If every input is excluded the
/// resulting stream emits no values and simply forwards completion.
///
/// # Example
/// ```
/// use ripple::stream::observable::Stream;
/// use ripple::stream::observer::ObserverBuilder;
/// use ripple::stream::transform::RunningAverage;
/// use std::sync::{Arc, Mutex};
///
/// let collected = Arc::new(Mutex::new(Vec::new()));
/// let capture = collected.clone();
/// Stream::of(vec![2, 3, 10, 12, 4])
///   .compose(&RunningAverage::new().threshold(5))
///   .subscribe(
///     ObserverBuilder::new()
///       .next(move |x| capture.lock().unwrap().push(x))
///       .build(),
///   );
/// assert_eq!(*collected.lock().unwrap(), [2.0, 2.5, 3.0]);
/// ```
pub struct RunningAverage {
  threshold: i64,
}

impl Default for RunningAverage {
  fn default() -> Self {
    RunningAverage {
      threshold: i64::MAX,
    }
  }
}

impl RunningAverage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Excludes inputs greater than or equal to `threshold`.
  pub fn threshold(mut self, threshold: i64) -> Self {
    self.threshold = threshold;
    self
  }
}

impl Transformer<i64, f64> for RunningAverage {
  fn transform(&self, stream: Stream<i64>) -> Stream<f64> {
    let threshold = self.threshold;
    stream
      .filter(move |value| *value < threshold)
      .scan(Average::default(), |acc, value| Average {
        sum: acc.sum + value,
        count: acc.count + 1,
      })
      .filter(|acc| acc.count > 0)
      .map(|acc| acc.sum as f64 / acc.count as f64)
  }
}
