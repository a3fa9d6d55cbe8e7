use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs `body` on a watchdog thread, panicking if it has not finished within
/// `timeout`. Keeps a hung producer thread from wedging the whole test run.
pub fn panic_after<T, F>(timeout: Duration, body: F) -> T
where
  T: Send + 'static,
  F: FnOnce() -> T + Send + 'static,
{
  let (done_tx, done_rx) = mpsc::channel();
  let handle = thread::Builder::new()
    .name("testing-thread".to_owned())
    .spawn(move || {
      let value = body();
      let _ = done_tx.send(());
      value
    })
    .expect("failed to spawn testing thread");
  match done_rx.recv_timeout(timeout) {
    Ok(()) => handle.join().expect("testing thread panicked"),
    Err(mpsc::RecvTimeoutError::Timeout) => {
      panic!("testing thread took longer than {:?}", timeout)
    }
    Err(mpsc::RecvTimeoutError::Disconnected) => {
      panic!("testing thread panicked")
    }
  }
}

/// [panic_after] with the default timeout, for tests that involve producer
/// threads.
pub fn async_context<T, F>(body: F) -> T
where
  T: Send + 'static,
  F: FnOnce() -> T + Send + 'static,
{
  panic_after(DEFAULT_TIMEOUT, body)
}
