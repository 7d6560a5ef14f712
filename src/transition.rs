//! Ramp and fade schedules for motor and LED transitions.
//!
//! Motors and LEDs both change output gradually in a fixed number of evenly
//! spaced frames. This module only computes the frames; the owners write them
//! to hardware and sleep between them.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use f01_rover::transition::Ramp;
//!
//! let ramp = Ramp::new(Duration::from_millis(300), 3);
//! let frames: Vec<i32> = ramp.frames(0, 30_000).collect();
//!
//! assert_eq!(frames, vec![10_000, 20_000, 30_000]);
//! assert_eq!(ramp.frame_delay(), Duration::from_millis(100));
//! ```

use core::time::Duration;

/// Number of frames in an LED fade.
pub const FADE_STEPS: u32 = 20;

/// Duration of a fade at `smooth == 100`.
pub const FULL_FADE: Duration = Duration::from_millis(1000);

/// A motor ramp: `steps` frames spread evenly over `duration`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ramp {
    /// Total time the ramp takes.
    pub duration: Duration,
    /// Number of frames written, including the final one.
    pub steps: u32,
}

impl Ramp {
    /// Snap straight to the target with a single write.
    pub const NONE: Self = Self {
        duration: Duration::ZERO,
        steps: 0,
    };

    /// 100 ms in three frames.
    pub const DEFAULT: Self = Self {
        duration: Duration::from_millis(100),
        steps: 3,
    };

    /// Creates a new ramp.
    pub const fn new(duration: Duration, steps: u32) -> Self {
        Self { duration, steps }
    }

    /// Creates a ramp from a duration in milliseconds.
    pub const fn from_millis(ms: u64, steps: u32) -> Self {
        Self::new(Duration::from_millis(ms), steps)
    }

    /// True if this ramp collapses to a single immediate write.
    #[inline]
    pub fn is_instant(&self) -> bool {
        self.steps <= 1 || self.duration.is_zero()
    }

    /// Sleep between two frames.
    pub fn frame_delay(&self) -> Duration {
        if self.steps == 0 {
            Duration::ZERO
        } else {
            self.duration / self.steps
        }
    }

    /// Signed duty frames from `from` (exclusive) to `to` (inclusive).
    ///
    /// Each frame is linearly interpolated and truncated toward zero. The last
    /// frame is always exactly `to`.
    pub fn frames(&self, from: i32, to: i32) -> RampFrames {
        RampFrames {
            from,
            to,
            steps: self.steps.max(1),
            index: 0,
        }
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Iterator over the frames of a [`Ramp`].
#[derive(Clone, Debug)]
pub struct RampFrames {
    from: i32,
    to: i32,
    steps: u32,
    index: u32,
}

impl Iterator for RampFrames {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.index >= self.steps {
            return None;
        }
        self.index += 1;

        let delta = (self.to as f64 - self.from as f64) * self.index as f64 / self.steps as f64;
        Some((self.from as f64 + delta) as i32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.steps - self.index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RampFrames {}

/// Duration of an LED fade for a `smooth` percentage.
///
/// `smooth` of 100 is one second, 200 two seconds. Negative or non-finite
/// values mean no fade.
pub fn fade_duration(smooth: f32) -> Duration {
    let smooth = if smooth.is_finite() { smooth.max(0.0) } else { 0.0 };
    // `as` saturates, so huge values cap at u64::MAX ms
    let ms = (FULL_FADE.as_millis() as f32 * (smooth / 100.0)) as u64;
    Duration::from_millis(ms)
}

/// Brightness frames of an LED fade from `from` (exclusive) to `to`.
///
/// Always [`FADE_STEPS`] frames, the last one exactly `to`.
pub fn fade_frames(from: f32, to: f32) -> impl Iterator<Item = f32> {
    (1..=FADE_STEPS).map(move |i| {
        if i == FADE_STEPS {
            to
        } else {
            from + (to - from) * i as f32 / FADE_STEPS as f32
        }
    })
}

/// Sleep between two fade frames, truncated to whole milliseconds.
pub fn fade_step_delay(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64 / FADE_STEPS as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_ramps() {
        assert!(Ramp::NONE.is_instant());
        assert!(Ramp::from_millis(100, 1).is_instant());
        assert!(Ramp::from_millis(0, 5).is_instant());
        assert!(!Ramp::DEFAULT.is_instant());
    }

    #[test]
    fn default_frame_delay() {
        assert_eq!(Ramp::DEFAULT.frame_delay(), Duration::from_nanos(33_333_333));
        assert_eq!(Ramp::NONE.frame_delay(), Duration::ZERO);
    }

    #[test]
    fn frames_end_exactly_at_target() {
        let frames: Vec<i32> = Ramp::from_millis(100, 7).frames(123, 65535).collect();
        assert_eq!(frames.len(), 7);
        assert_eq!(*frames.last().unwrap(), 65535);
    }

    #[test]
    fn frames_truncate_toward_zero() {
        // 0 -> 10 in 3 steps: 3.33, 6.67, 10
        let frames: Vec<i32> = Ramp::from_millis(30, 3).frames(0, 10).collect();
        assert_eq!(frames, vec![3, 6, 10]);

        // 0 -> -10 in 3 steps: -3.33, -6.67, -10
        let frames: Vec<i32> = Ramp::from_millis(30, 3).frames(0, -10).collect();
        assert_eq!(frames, vec![-3, -6, -10]);
    }

    #[test]
    fn reversal_frames_cross_zero_monotonically() {
        let frames: Vec<i32> = Ramp::DEFAULT.frames(39321, -39321).collect();
        assert_eq!(frames, vec![13107, -13107, -39321]);
        assert!(frames.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn frames_exact_size() {
        let mut frames = Ramp::DEFAULT.frames(0, 100);
        assert_eq!(frames.len(), 3);
        frames.next();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn fade_duration_scales_with_smooth() {
        assert_eq!(fade_duration(0.0), Duration::ZERO);
        assert_eq!(fade_duration(25.0), Duration::from_millis(250));
        assert_eq!(fade_duration(100.0), Duration::from_millis(1000));
        assert_eq!(fade_duration(400.0), Duration::from_millis(4000));
        assert_eq!(fade_duration(-10.0), Duration::ZERO);
        assert_eq!(fade_duration(f32::NAN), Duration::ZERO);
        assert_eq!(fade_duration(f32::INFINITY), Duration::ZERO);
    }

    #[test]
    fn fade_step_delay_truncates() {
        assert_eq!(fade_step_delay(Duration::from_millis(250)), Duration::from_millis(12));
        assert_eq!(fade_step_delay(Duration::from_millis(1000)), Duration::from_millis(50));
    }

    #[test]
    fn fade_frames_reach_target() {
        let frames: Vec<f32> = fade_frames(0.0, 50.0).collect();
        assert_eq!(frames.len(), FADE_STEPS as usize);
        assert!((frames[0] - 2.5).abs() < 1e-4);
        assert_eq!(*frames.last().unwrap(), 50.0);
    }

    #[test]
    fn fade_frames_downward() {
        let frames: Vec<f32> = fade_frames(100.0, 25.0).collect();
        assert!(frames.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(*frames.last().unwrap(), 25.0);
    }
}
