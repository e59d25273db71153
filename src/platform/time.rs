use std::time::{Duration, Instant};

/// Wall-clock time since startup.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    start: Instant,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds since startup
    pub fn total_time(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_time_is_monotonic() {
        let time = Time::new();
        let first = time.total_time();
        std::thread::sleep(Duration::from_millis(2));
        assert!(time.total_time() > first);
    }
}
