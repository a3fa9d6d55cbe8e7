use ripple::stream::observable::{Stream, StreamType};
use ripple::stream::observer::{Fault, Observer, ObserverBuilder};
use ripple::stream::ops::*;
use ripple::stream::transform::RunningAverage;
use ripple::utils::testing;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn leaky_source() -> Stream<i64> {
  Stream::new(|observer, _subscription| {
    observer.on_next(1);
    observer.on_next(2);
    observer.on_complete();
    observer.on_next(3);
    observer.on_complete();
  })
}

struct Collector<T> {
  values: Mutex<Vec<T>>,
  faults: AtomicUsize,
  completions: AtomicUsize,
}

impl<T> Collector<T> {
  fn new() -> Arc<Self> {
    Arc::new(Collector {
      values: Mutex::new(Vec::new()),
      faults: AtomicUsize::new(0),
      completions: AtomicUsize::new(0),
    })
  }

  fn values(&self) -> Vec<T>
  where
    T: Clone,
  {
    self.values.lock().unwrap().clone()
  }

  fn terminals(&self) -> usize {
    self.faults.load(Ordering::Relaxed)
      + self.completions.load(Ordering::Relaxed)
  }
}

impl<T> Observer<T> for Collector<T>
where
  T: StreamType,
{
  fn on_next(&self, value: T) {
    self.values.lock().unwrap().push(value);
  }

  fn on_error(&self, _fault: Fault) {
    self.faults.fetch_add(1, Ordering::Relaxed);
  }

  fn on_complete(&self) {
    self.completions.fetch_add(1, Ordering::Relaxed);
  }
}

#[test]
fn running_average_test() {
  println!("START running_average_test");
  let collector = Collector::new();
  Stream::of(vec![2, 3, 10, 12, 4])
    .compose(&RunningAverage::new())
    .subscribe(collector.clone());
  assert_eq!(collector.values(), [2.0, 2.5, 5.0, 6.75, 6.2]);
  assert_eq!(collector.completions.load(Ordering::Relaxed), 1);
  assert_eq!(collector.faults.load(Ordering::Relaxed), 0);
  println!("END running_average_test");
}

#[test]
fn running_average_threshold_test() {
  println!("START running_average_threshold_test");
  let collector = Collector::new();
  Stream::of(vec![2, 3, 10, 12, 4])
    .compose(&RunningAverage::new().threshold(5))
    .subscribe(collector.clone());
  assert_eq!(collector.values(), [2.0, 2.5, 3.0]);
  assert_eq!(collector.completions.load(Ordering::Relaxed), 1);
  println!("END running_average_threshold_test");
}

#[test]
fn lifted_map_over_range_test() {
  println!("START lifted_map_over_range_test");
  let collector = Collector::new();
  Stream::range(0, 5)
    .map(|x| format!("{}!", x))
    .subscribe(collector.clone());
  assert_eq!(collector.values(), ["0!", "1!", "2!", "3!", "4!"]);
  assert_eq!(collector.completions.load(Ordering::Relaxed), 1);
  assert_eq!(collector.faults.load(Ordering::Relaxed), 0);
  println!("END lifted_map_over_range_test");
}

#[test]
fn safe_subscription_test() {
  println!("START safe_subscription_test");
  let collector = Collector::new();
  let subscription = leaky_source().subscribe(collector.clone());
  assert_eq!(collector.values(), [1, 2]);
  assert_eq!(collector.terminals(), 1);
  assert!(subscription.cancelled());
  println!("END safe_subscription_test");
}

#[test]
fn unsafe_subscription_test() {
  println!("START unsafe_subscription_test");
  let collector = Collector::new();
  let subscription = leaky_source().subscribe_unsafe(collector.clone());
  assert_eq!(collector.values(), [1, 2, 3]);
  assert_eq!(collector.completions.load(Ordering::Relaxed), 2);
  assert!(subscription.active());
  println!("END unsafe_subscription_test");
}

#[test]
fn serialized_unsafe_subscription_test() {
  println!("START serialized_unsafe_subscription_test");
  let collector = Collector::new();
  let subscription =
    leaky_source().serialize().subscribe_unsafe(collector.clone());
  assert_eq!(collector.values(), [1, 2]);
  assert_eq!(collector.terminals(), 1);
  assert!(subscription.active());
  println!("END serialized_unsafe_subscription_test");
}

#[test]
fn cancel_idempotence_test() {
  println!("START cancel_idempotence_test");
  let collector = Collector::<i64>::new();
  let subscription = Stream::of(vec![1]).subscribe_unsafe(collector);
  subscription.cancel();
  let cancelled_once = subscription.cancelled();
  subscription.cancel();
  assert_eq!(subscription.cancelled(), cancelled_once);
  assert!(subscription.cancelled());
  println!("END cancel_idempotence_test");
}

#[test]
fn serialized_concurrent_emission_test() {
  println!("START serialized_concurrent_emission_test");
  testing::async_context(|| {
    let threads = 4;
    let per_thread = 250;
    let source = Stream::new(move |observer: Arc<dyn Observer<i64>>, _subscription| {
      let mut handles = Vec::new();
      for thread in 0..threads {
        let observer = observer.clone();
        handles.push(std::thread::spawn(move || {
          for i in 0..per_thread {
            observer.on_next((thread * per_thread + i) as i64);
          }
        }));
      }
      for handle in handles {
        handle.join().unwrap();
      }
      observer.on_complete();
    });
    let delivered = Arc::new(AtomicUsize::new(0));
    let completions = Arc::new(AtomicUsize::new(0));
    let entered = Arc::new(AtomicBool::new(false));
    let count_capture = delivered.clone();
    let entered_capture = entered.clone();
    let completion_capture = completions.clone();
    let observer = ObserverBuilder::new()
      .next(move |_: i64| {
        assert!(
          !entered_capture.swap(true, Ordering::SeqCst),
          "overlapping delivery"
        );
        count_capture.fetch_add(1, Ordering::Relaxed);
        std::thread::yield_now();
        entered_capture.store(false, Ordering::SeqCst);
      })
      .complete(move || {
        completion_capture.fetch_add(1, Ordering::Relaxed);
      })
      .build();
    source.serialize().subscribe(observer);
    assert_eq!(delivered.load(Ordering::Relaxed), threads * per_thread);
    assert_eq!(completions.load(Ordering::Relaxed), 1);
  });
  println!("END serialized_concurrent_emission_test");
}

#[test]
fn operator_fault_test() {
  println!("START operator_fault_test");
  let values = Arc::new(Mutex::new(Vec::new()));
  let messages = Arc::new(Mutex::new(Vec::new()));
  let value_capture = values.clone();
  let message_capture = messages.clone();
  let observer = ObserverBuilder::new()
    .next(move |x: i64| value_capture.lock().unwrap().push(x))
    .error(move |fault| {
      message_capture.lock().unwrap().push(fault.to_string())
    })
    .build();
  let subscription = Stream::of(vec![1, 2, 0, 4])
    .map(|x| {
      if x == 0 {
        panic!("zero is not welcome here");
      }
      100 / x
    })
    .subscribe(observer);
  assert_eq!(*values.lock().unwrap(), [100, 50]);
  assert_eq!(
    *messages.lock().unwrap(),
    ["operator stage panicked: zero is not welcome here"]
  );
  assert!(subscription.cancelled());
  println!("END operator_fault_test");
}

#[test]
#[should_panic(expected = "broken producer")]
fn producer_fault_test() {
  let stream: Stream<i64> =
    Stream::new(|_observer, _subscription| panic!("broken producer"));
  stream.subscribe(ObserverBuilder::new().build());
}

#[test]
fn transformer_reuse_test() {
  println!("START transformer_reuse_test");
  let averaged = Stream::of(vec![2, 4, 6]).compose(&RunningAverage::new());
  let first = Collector::new();
  let second = Collector::new();
  averaged.subscribe(first.clone());
  averaged.subscribe(second.clone());
  assert_eq!(first.values(), [2.0, 3.0, 4.0]);
  assert_eq!(second.values(), [2.0, 3.0, 4.0]);
  assert_eq!(first.completions.load(Ordering::Relaxed), 1);
  assert_eq!(second.completions.load(Ordering::Relaxed), 1);
  println!("END transformer_reuse_test");
}

#[test]
fn complex_chain_test() {
  println!("START complex_chain_test");
  let collector = Collector::new();
  Stream::range(1, 10)
    .filter(|x| x % 2 == 0)
    .take(3)
    .map(|x| format!("{}_", x))
    .subscribe(collector.clone());
  assert_eq!(collector.values(), ["2_", "4_", "6_"]);
  assert_eq!(collector.completions.load(Ordering::Relaxed), 1);
  println!("END complex_chain_test");
}
