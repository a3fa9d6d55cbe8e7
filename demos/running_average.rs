//! A small tour of ripple: a composed running-average transformer and
//! serialized delivery from concurrent producer threads.

use ripple::stream::observable::Stream;
use ripple::stream::observer::{Observer, ObserverBuilder};
use ripple::stream::ops::*;
use ripple::stream::transform::RunningAverage;

use std::sync::Arc;

fn main() {
  // Reusable description of a fixed reading sequence.
  let readings = Stream::of(vec![2, 3, 10, 12, 4]);

  println!("running average, all readings:");
  readings
    .compose(&RunningAverage::new())
    .subscribe(
      ObserverBuilder::new()
        .next(|average: f64| println!("  {:.2}", average))
        .complete(|| println!("  done"))
        .build(),
    );

  println!("running average, readings below 5:");
  readings
    .compose(&RunningAverage::new().threshold(5))
    .subscribe(
      ObserverBuilder::new()
        .next(|average: f64| println!("  {:.2}", average))
        .complete(|| println!("  done"))
        .build(),
    );

  println!("labelled readings:");
  readings
    .take(3)
    .map(|x| format!("reading<{}>", x))
    .subscribe(
      ObserverBuilder::new()
        .next(|label: String| println!("  {}", label))
        .build(),
    );

  // Two producer threads share one observer; serialize keeps their
  // deliveries from interleaving.
  let concurrent = Stream::new(|observer: Arc<dyn Observer<i64>>, _subscription| {
    let mut handles = Vec::new();
    for thread in 0..2 {
      let observer = observer.clone();
      handles.push(std::thread::spawn(move || {
        for i in 0..3 {
          observer.on_next(thread * 100 + i);
        }
      }));
    }
    for handle in handles {
      handle.join().unwrap();
    }
    observer.on_complete();
  });

  println!("serialized concurrent readings:");
  concurrent.serialize().subscribe(
    ObserverBuilder::new()
      .next(|x: i64| println!("  {}", x))
      .complete(|| println!("  done"))
      .build(),
  );
}
