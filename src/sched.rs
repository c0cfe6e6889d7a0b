// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Frame gating and the adaptive quality loop.
//!
//! should_render decouples the host redraw cadence (uncontrolled) from
//! the intended simulation rate: callers poll every redraw callback
//! and only do work when a full frame interval has elapsed.
//!
//! Quality adapts every 60 accepted frames. Sustained low throughput
//! steps the quality scalar down and shrinks the live entity budget;
//! recovered throughput only restores the scalar, counts stay shrunk
//! until the next reset. The asymmetry is deliberate: regrowing counts
//! on the first good average re-triggers the overload it just escaped.

use crate::config::Tuning;
use log::info;
use std::collections::VecDeque;

pub const QUALITY_FLOOR: f32 = 0.3;
pub const QUALITY_CEIL: f32 = 1.0;
/// Accepted frames between two quality evaluations.
pub const QUALITY_EVAL_FRAMES: u32 = 60;
const DEGRADE_STEP: f32 = 0.9;
const RECOVER_STEP: f32 = 1.1;
const LOW_WATER: f32 = 0.8;
const HIGH_WATER: f32 = 0.95;

/// Rolling frames-per-second over a one second window.
pub struct FpsCounter {
    stamps: VecDeque<f64>,
    window_ms: f64,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            stamps: VecDeque::new(),
            window_ms: 1000.0,
        }
    }

    pub fn note(&mut self, now: f64) {
        self.stamps.push_back(now);
        while let Some(&front) = self.stamps.front() {
            if front < now - self.window_ms {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// None until two frames landed in the window.
    pub fn average(&self) -> Option<f32> {
        if self.stamps.len() < 2 {
            return None;
        }
        let span = self.stamps.back().unwrap() - self.stamps.front().unwrap();
        if span <= 0.0 {
            return None;
        }
        Some(((self.stamps.len() - 1) as f64 * 1000.0 / span) as f32)
    }
}

pub struct FrameScheduler {
    pub target_fps: u32,
    interval_ms: f64,
    last_render: Option<f64>,
    pub accepted: u32,
}

impl FrameScheduler {
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        Self {
            target_fps: fps,
            interval_ms: 1000.0 / fps as f64,
            last_render: None,
            accepted: 0,
        }
    }

    /// True at most once per frame interval; the caller must
    /// reschedule without doing any work on false.
    pub fn should_render(&mut self, now: f64) -> bool {
        match self.last_render {
            Some(t) if now - t < self.interval_ms => false,
            _ => {
                self.last_render = Some(now);
                true
            }
        }
    }

    /// Count one accepted (actually rendered) frame.
    pub fn note_frame(&mut self) {
        self.accepted = self.accepted.wrapping_add(1);
    }

    /// Re-evaluate quality against the externally maintained rolling
    /// average. Called after every accepted frame; acts every
    /// QUALITY_EVAL_FRAMES of them.
    pub fn update_quality(&mut self, avg_fps: f32, tuning: &mut Tuning) {
        if self.accepted == 0 || self.accepted % QUALITY_EVAL_FRAMES != 0 {
            return;
        }
        let target = self.target_fps as f32;
        if avg_fps < target * LOW_WATER {
            let before = tuning.quality;
            tuning.quality = (tuning.quality * DEGRADE_STEP).max(QUALITY_FLOOR);
            tuning.degrade(DEGRADE_STEP);
            info!(
                "quality degraded {:.2} -> {:.2} (avg {:.1} fps, target {})",
                before, tuning.quality, avg_fps, self.target_fps
            );
        } else if avg_fps > target * HIGH_WATER && tuning.quality < QUALITY_CEIL {
            tuning.quality = (tuning.quality * RECOVER_STEP).min(QUALITY_CEIL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SplashConfig, Tuning, DRIFT_MIN};
    use crate::util::Rand;

    #[test]
    fn test_should_render_rate_limited() {
        let mut sched = FrameScheduler::new(60);
        let interval = 1000.0 / 60.0;
        let mut now = 0.0;
        let mut accepted = 0;
        // continuous 1ms polling over 60 windows
        while now < interval * 60.0 {
            if sched.should_render(now) {
                accepted += 1;
            }
            now += 1.0;
        }
        // at most once per window, at least once per two windows
        assert!(accepted <= 61, "accepted {accepted}");
        assert!(accepted >= 30, "accepted {accepted}");
    }

    #[test]
    fn test_first_poll_renders() {
        let mut sched = FrameScheduler::new(30);
        assert!(sched.should_render(5.0));
        assert!(!sched.should_render(6.0));
    }

    #[test]
    fn test_quality_never_leaves_bounds() {
        let cfg = SplashConfig::default();
        let mut tuning = Tuning::from_config(&cfg);
        let mut sched = FrameScheduler::new(60);
        let mut rand = Rand::new();
        rand.srand(5);
        for _ in 0..10_000 {
            sched.note_frame();
            let fps = rand.gen_range_f32(1.0, 200.0);
            sched.update_quality(fps, &mut tuning);
            assert!((QUALITY_FLOOR..=QUALITY_CEIL).contains(&tuning.quality));
        }
    }

    #[test]
    fn test_sustained_low_fps_degrades_once_per_window() {
        let cfg = SplashConfig::default();
        let mut tuning = Tuning::from_config(&cfg);
        let drift0 = tuning.drift_count;
        let mut sched = FrameScheduler::new(60);
        for _ in 0..QUALITY_EVAL_FRAMES {
            sched.note_frame();
            sched.update_quality(20.0, &mut tuning);
        }
        assert!((tuning.quality - 0.9).abs() < 1e-6);
        assert_eq!(tuning.drift_count, (drift0 as f32 * 0.9) as usize);
    }

    #[test]
    fn test_counts_never_drop_below_family_minimum() {
        let cfg = SplashConfig::default();
        let mut tuning = Tuning::from_config(&cfg);
        let mut sched = FrameScheduler::new(60);
        for _ in 0..QUALITY_EVAL_FRAMES * 200 {
            sched.note_frame();
            sched.update_quality(10.0, &mut tuning);
        }
        assert_eq!(tuning.quality, QUALITY_FLOOR);
        assert_eq!(tuning.drift_count, DRIFT_MIN);
    }

    #[test]
    fn test_recovery_restores_quality_but_not_counts() {
        let cfg = SplashConfig::default();
        let mut tuning = Tuning::from_config(&cfg);
        let mut sched = FrameScheduler::new(60);
        for _ in 0..QUALITY_EVAL_FRAMES {
            sched.note_frame();
            sched.update_quality(20.0, &mut tuning);
        }
        let shrunk = tuning.drift_count;
        assert!(tuning.quality < 1.0);
        for _ in 0..QUALITY_EVAL_FRAMES * 10 {
            sched.note_frame();
            sched.update_quality(60.0, &mut tuning);
        }
        assert_eq!(tuning.quality, QUALITY_CEIL);
        assert_eq!(tuning.drift_count, shrunk, "counts must not regrow");
    }

    #[test]
    fn test_fps_counter_average() {
        let mut fps = FpsCounter::new();
        assert!(fps.average().is_none());
        for i in 0..20 {
            fps.note(i as f64 * 50.0);
        }
        let avg = fps.average().unwrap();
        assert!((avg - 20.0).abs() < 1.0, "avg {avg}");
    }
}
