use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Create a single-use stop notification for one session.
///
/// The controller keeps the trigger; the capture loop polls the listener.
pub fn stop_signal() -> (StopTrigger, StopListener) {
    let flag = Arc::new(AtomicBool::new(false));
    (
        StopTrigger {
            flag: Some(Arc::clone(&flag)),
        },
        StopListener { flag },
    )
}

/// Writing half. Firing consumes it; dropping it unfired also fires.
#[derive(Debug)]
pub struct StopTrigger {
    flag: Option<Arc<AtomicBool>>,
}

impl StopTrigger {
    pub fn fire(mut self) {
        self.set();
    }

    fn set(&mut self) {
        if let Some(flag) = self.flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl Drop for StopTrigger {
    fn drop(&mut self) {
        self.set();
    }
}

/// Reading half. Once fired, stays fired.
#[derive(Debug, Clone)]
pub struct StopListener {
    flag: Arc<AtomicBool>,
}

impl StopListener {
    /// Non-blocking poll.
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
