//! Run-loop context.
//!
//! Boot time and the status indicator used to live in module-level globals on
//! the embedded target; here they are an explicit object owned by the run
//! loop and passed where needed.

use std::time::{Duration, Instant};

/// Status indicator seam. On hardware this drives a GPIO LED; tests count
/// pulses instead.
pub trait StatusLed {
    /// Light the indicator for roughly the given duration.
    fn pulse(&mut self, duration: Duration);
}

/// Indicator that does nothing, for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLed;

impl StatusLed for NullLed {
    fn pulse(&mut self, _duration: Duration) {}
}

/// State owned by the run loop: the boot instant for uptime reporting and
/// the status indicator handle.
pub struct NodeContext {
    boot: Instant,
    led: Box<dyn StatusLed>,
}

impl NodeContext {
    pub fn new(led: Box<dyn StatusLed>) -> Self {
        NodeContext {
            boot: Instant::now(),
            led,
        }
    }

    /// Milliseconds since boot, as carried in status messages.
    pub fn uptime_ms(&self) -> u32 {
        self.boot.elapsed().as_millis() as u32
    }

    pub fn pulse_led(&mut self, duration: Duration) {
        self.led.pulse(duration);
    }
}

impl Default for NodeContext {
    fn default() -> Self {
        NodeContext::new(Box::new(NullLed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_uptime_advances() {
        let context = NodeContext::default();
        let first = context.uptime_ms();
        thread::sleep(Duration::from_millis(15));
        assert!(context.uptime_ms() >= first + 10);
    }
}
