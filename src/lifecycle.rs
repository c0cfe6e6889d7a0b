// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Resource lifecycle: periodic buffer reclamation, pause/resume on
//! visibility changes and the surface-loss recovery path.
//!
//! Hiding halts every scene loop and cancels outstanding frame
//! requests. Showing fires a settle timer; the orchestrator resumes
//! the active phase when it lands, so a burst of visibility flaps
//! does not restart scenes mid-flap. A long stay in the background
//! tears entities down and forces a full reset on return.

use crate::event::{timer_cancel, timer_fire, timer_register};
use crate::render::scene::Scene;
use log::{info, warn};

/// Reclamation runs at most once per this interval.
pub const RECLAIM_INTERVAL_MS: f64 = 5_000.0;
/// Delay between visibility-shown and actually resuming, seconds.
pub const SETTLE_SECS: f32 = 0.35;
/// Hidden longer than this: entities are discarded, resume resets.
pub const TEARDOWN_AFTER_MS: f64 = 30_000.0;

pub const SETTLE_TIMER: &str = "splash.settle";
pub const SETTLE_LISTENER: &str = "orchestrator.settle";

pub struct LifecycleManager {
    pub hidden: bool,
    pub surface_lost: bool,
    hidden_since: f64,
    last_reclaim: f64,
    needs_reset: bool,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleManager {
    pub fn new() -> Self {
        timer_register(SETTLE_TIMER, SETTLE_SECS, SETTLE_LISTENER);
        Self {
            hidden: false,
            surface_lost: false,
            hidden_since: 0.0,
            last_reclaim: 0.0,
            needs_reset: false,
        }
    }

    /// Throttled defensive sweep: trim every entity buffer back to its
    /// cap. Normal eviction already enforces the caps, this is the
    /// backstop.
    pub fn maintain(&mut self, now: f64, scenes: &mut [&mut Scene]) {
        if now - self.last_reclaim < RECLAIM_INTERVAL_MS {
            return;
        }
        self.last_reclaim = now;
        for scene in scenes.iter_mut() {
            scene.trim_history();
        }
    }

    pub fn on_visibility(&mut self, hidden: bool, now: f64, scenes: &mut [&mut Scene]) {
        if hidden == self.hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            info!("hidden: halting scene loops");
            self.hidden_since = now;
            for scene in scenes.iter_mut() {
                scene.pause();
            }
            timer_cancel(SETTLE_TIMER, true);
        } else {
            if now - self.hidden_since > TEARDOWN_AFTER_MS {
                self.needs_reset = true;
            }
            timer_fire(SETTLE_TIMER, 0u8);
        }
    }

    pub fn on_surface_lost(&mut self, scenes: &mut [&mut Scene]) {
        if self.surface_lost {
            return;
        }
        warn!("drawing surface lost, suspending scenes");
        self.surface_lost = true;
        for scene in scenes.iter_mut() {
            scene.pause();
        }
    }

    /// Restoration always goes through a full reset, never an in-place
    /// repair.
    pub fn on_surface_restored(&mut self) {
        if self.surface_lost {
            info!("drawing surface restored");
        }
        self.surface_lost = false;
        self.needs_reset = true;
    }

    pub fn take_needs_reset(&mut self) -> bool {
        std::mem::take(&mut self.needs_reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{snapshot, SplashConfig, Tuning};
    use crate::context::{Context, ManualClock};
    use crate::event::{event_check, timer_update};
    use crate::field::MatrixField;
    use crate::render::surface::MemorySurface;
    use crate::SPLASH_FRAME;

    fn scene() -> (Scene, Context, crate::config::TickSnapshot) {
        let cfg = SplashConfig::default();
        let snap = snapshot(&cfg, &Tuning::from_config(&cfg));
        let scene = Scene::new(
            "m",
            Box::new(MemorySurface::new(320, 240)),
            Box::new(MatrixField::new()),
            60,
        );
        (scene, Context::new(Box::new(ManualClock::new())), snap)
    }

    #[test]
    fn test_hide_pauses_show_arms_settle_timer() {
        let (mut s, mut ctx, snap) = scene();
        let mut lc = LifecycleManager::new();
        s.reset(&mut ctx, &snap);
        s.resume();
        lc.on_visibility(true, 1000.0, &mut [&mut s]);
        assert!(!s.is_active());
        // repeated hide is a no-op
        lc.on_visibility(true, 1001.0, &mut [&mut s]);
        assert!(!s.is_active());

        lc.on_visibility(false, 2000.0, &mut [&mut s]);
        // scene resumes only after the settle timer lands
        assert!(!s.is_active());
        let frames = (SETTLE_SECS * SPLASH_FRAME as f32) as u32;
        for _ in 0..frames {
            timer_update();
        }
        assert!(event_check(SETTLE_TIMER, SETTLE_LISTENER));
    }

    #[test]
    fn test_long_hide_forces_reset() {
        let (mut s, _ctx, _snap) = scene();
        let mut lc = LifecycleManager::new();
        lc.on_visibility(true, 0.0, &mut [&mut s]);
        lc.on_visibility(false, TEARDOWN_AFTER_MS + 1.0, &mut [&mut s]);
        assert!(lc.take_needs_reset());
        assert!(!lc.take_needs_reset());
    }

    #[test]
    fn test_maintain_is_throttled() {
        let (mut s, mut ctx, snap) = scene();
        let mut lc = LifecycleManager::new();
        s.reset(&mut ctx, &snap);
        lc.maintain(RECLAIM_INTERVAL_MS + 1.0, &mut [&mut s]);
        let first = lc.last_reclaim;
        lc.maintain(RECLAIM_INTERVAL_MS + 2.0, &mut [&mut s]);
        assert_eq!(lc.last_reclaim, first);
        lc.maintain(first + RECLAIM_INTERVAL_MS, &mut [&mut s]);
        assert!(lc.last_reclaim > first);
    }

    #[test]
    fn test_surface_loss_and_restore() {
        let (mut s, mut ctx, snap) = scene();
        let mut lc = LifecycleManager::new();
        s.reset(&mut ctx, &snap);
        s.resume();
        lc.on_surface_lost(&mut [&mut s]);
        assert!(lc.surface_lost);
        assert!(!s.is_active());
        lc.on_surface_lost(&mut [&mut s]);
        lc.on_surface_restored();
        assert!(!lc.surface_lost);
        assert!(lc.take_needs_reset());
    }
}
