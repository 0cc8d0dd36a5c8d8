//! Timing and interpolation helpers for element transitions.

use serde::Serialize;

/// Cubic in-out easing, symmetric around `t = 0.5`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// A time window on the host clock (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl Timing {
    pub fn new(start_ms: f64, duration_ms: f64) -> Self {
        Self {
            start_ms,
            duration_ms,
        }
    }

    /// Linear progress in `[0, 1]`. A zero duration completes immediately.
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Eased progress.
    pub fn eased(&self, now_ms: f64) -> f32 {
        ease_cubic_in_out(self.progress(now_ms)) as f32
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
        assert!(ease_cubic_in_out(0.75) > 0.75);
        // Clamped outside the unit interval
        assert_eq!(ease_cubic_in_out(-1.0), 0.0);
        assert_eq!(ease_cubic_in_out(2.0), 1.0);
    }

    #[test]
    fn test_timing() {
        let timing = Timing::new(100.0, 500.0);
        assert_eq!(timing.progress(0.0), 0.0);
        assert_eq!(timing.progress(350.0), 0.5);
        assert!(!timing.is_finished(599.0));
        assert!(timing.is_finished(600.0));
        assert_eq!(timing.end_ms(), 600.0);
        assert!(Timing::new(0.0, 0.0).is_finished(0.0));
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(10.0, 20.0, 0.5), 15.0);
        assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
    }
}
