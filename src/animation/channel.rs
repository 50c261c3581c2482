use kurbo::BezPath;
use serde::{Deserialize, Serialize};

use crate::animation::Ease;
use crate::core::interpolate_paths;

/// Values a [`Channel`] can tween between.
pub trait Interpolate: Clone {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        from + (to - from) * t
    }
}

impl Interpolate for BezPath {
    /// Structurally different paths cannot be morphed and jump to the target
    /// as soon as the tween starts.
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        interpolate_paths(from, to, t).unwrap_or_else(|| {
            if t <= 0.0 { from.clone() } else { to.clone() }
        })
    }
}

/// Delay and duration of one scheduled transition, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timing {
    pub delay_ms: f64,
    pub duration_ms: f64,
}

impl Timing {
    #[must_use]
    pub const fn new(duration_ms: f64) -> Self {
        Self {
            delay_ms: 0.0,
            duration_ms,
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tween<T> {
    from: T,
    to: T,
    begin_ms: f64,
    duration_ms: f64,
    ease: Ease,
    serial: u64,
}

impl<T: Interpolate> Tween<T> {
    fn end_ms(&self) -> f64 {
        self.begin_ms + self.duration_ms.max(0.0)
    }

    fn sample(&self, now_ms: f64) -> T {
        if now_ms < self.begin_ms {
            return self.from.clone();
        }
        if self.duration_ms <= 0.0 || now_ms >= self.end_ms() {
            return self.to.clone();
        }
        let progress = (now_ms - self.begin_ms) / self.duration_ms;
        T::interpolate(&self.from, &self.to, self.ease.apply(progress))
    }
}

/// One animatable attribute of a scene node.
///
/// A new transition supersedes the in-flight one and starts from the value
/// sampled at scheduling time, so interrupted transitions are redirected
/// rather than restarted.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel<T> {
    value: T,
    tween: Option<Tween<T>>,
}

impl<T: Interpolate> Channel<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { value, tween: None }
    }

    #[must_use]
    pub fn sample(&self, now_ms: f64) -> T {
        match &self.tween {
            Some(tween) => tween.sample(now_ms),
            None => self.value.clone(),
        }
    }

    /// Value the channel converges to once every transition finishes.
    #[must_use]
    pub fn target(&self) -> &T {
        match &self.tween {
            Some(tween) => &tween.to,
            None => &self.value,
        }
    }

    /// Sets the value immediately and cancels any in-flight transition.
    pub fn snap(&mut self, value: T) {
        self.value = value;
        self.tween = None;
    }

    pub fn animate(&mut self, now_ms: f64, to: T, timing: Timing, ease: Ease, serial: u64) {
        let from = self.sample(now_ms);
        self.value = from.clone();
        self.tween = Some(Tween {
            from,
            to,
            begin_ms: now_ms + timing.delay_ms.max(0.0),
            duration_ms: timing.duration_ms.max(0.0),
            ease,
            serial,
        });
    }

    /// Serial of the in-flight transition, if any.
    #[must_use]
    pub fn active_serial(&self) -> Option<u64> {
        self.tween.as_ref().map(|tween| tween.serial)
    }

    #[must_use]
    pub fn end_ms(&self) -> Option<f64> {
        self.tween.as_ref().map(Tween::end_ms)
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Folds a finished transition into the stored value.
    pub fn settle(&mut self, now_ms: f64) {
        if let Some(tween) = self.tween.take() {
            if now_ms >= tween.end_ms() {
                self.value = tween.to;
            } else {
                self.tween = Some(tween);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retarget_starts_from_sampled_value() {
        let mut channel = Channel::new(0.0);
        channel.animate(0.0, 10.0, Timing::new(100.0), Ease::Linear, 1);
        channel.animate(50.0, 0.0, Timing::new(100.0), Ease::Linear, 2);
        assert!((channel.sample(50.0) - 5.0).abs() < 1e-12);
        assert!((channel.sample(100.0) - 2.5).abs() < 1e-12);
        assert_eq!(channel.active_serial(), Some(2));
    }

    #[test]
    fn delay_holds_the_start_value() {
        let mut channel = Channel::new(4.0);
        channel.animate(0.0, 8.0, Timing::new(10.0).with_delay(20.0), Ease::Linear, 1);
        assert_eq!(channel.sample(19.0), 4.0);
        assert_eq!(channel.sample(30.0), 8.0);
        channel.settle(30.0);
        assert!(!channel.is_animating());
        assert_eq!(*channel.target(), 8.0);
    }
}
