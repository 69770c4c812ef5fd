use std::time::Duration;

/// Default length of a scroll-to-top/bottom animation.
pub const DEFAULT_SCROLL_DURATION: Duration = Duration::from_millis(200);

/// A scroll from one offset to another over a fixed duration.
///
/// The position is a pure function of elapsed time, so a late frame
/// simply lands further along instead of queueing extra steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    from: f64,
    to: f64,
    duration: Duration,
}

impl ScrollAnimation {
    pub const fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    pub const fn destination(&self) -> f64 {
        self.to
    }

    /// Scroll offset after `elapsed`, eased out and clamped at the destination.
    pub fn position_at(&self, elapsed: Duration) -> f64 {
        if self.is_finished(elapsed) {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(3);
        (self.to - self.from).mul_add(eased, self.from)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
