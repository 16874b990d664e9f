use std::sync::{Arc, Mutex};
use std::time::Duration;
use tollgate::{FixedWindowLimiter, ManualClock, SleepFuture, Sleeper};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

/// Sleeper that moves a [`ManualClock`] forward by each requested delay, so a limiter
/// sharing that clock observes the wait as having happened.
#[derive(Debug, Clone)]
pub struct AdvancingSleeper {
    clock: ManualClock,
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl AdvancingSleeper {
    pub fn new(clock: ManualClock) -> Self {
        Self { clock, calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

impl Sleeper for AdvancingSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        self.calls.lock().unwrap().push(duration);
        self.clock.advance(duration);
        Box::pin(std::future::ready(()))
    }
}

/// Limiter over a manual clock starting at `start`, waiting through an [`AdvancingSleeper`].
pub fn manual_limiter(
    capacity: u32,
    window: Duration,
    start: Duration,
) -> (FixedWindowLimiter, ManualClock, AdvancingSleeper) {
    let clock = ManualClock::new(start);
    let sleeper = AdvancingSleeper::new(clock.clone());
    let limiter = FixedWindowLimiter::builder()
        .capacity(capacity)
        .window(window)
        .clock(clock.clone())
        .sleeper(sleeper.clone())
        .build()
        .expect("valid limiter config");
    (limiter, clock, sleeper)
}

#[derive(Clone)]
struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedGuard;
    fn make_writer(&'a self) -> Self::Writer {
        SharedGuard(self.0.clone())
    }
}

struct SharedGuard(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedGuard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Install a thread-local subscriber capturing every level; returns the guard and buffer.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, Arc<Mutex<Vec<u8>>>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(BoxMakeWriter::new(SharedWriter(buffer.clone())))
        .with_max_level(tracing::Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}

pub fn logs(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
}
