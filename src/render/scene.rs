// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! One Scene owns one surface, one entity family and its own frame
//! gate, so the three scenes tick independently at their own pace.
//!
//! The host redraw callback is modelled as an explicit frame loop with
//! generation tokens: pausing cancels the pending token, and a token
//! that was cancelled (or superseded) is refused at the top of the
//! callback body. That is what keeps an already-fired stale callback
//! from resurrecting a destroyed scene.

use crate::{
    config::{TickSnapshot, Tuning},
    context::Context,
    error::SplashError,
    field::Field,
    render::{style::Rgba, surface::Surface},
    sched::{FpsCounter, FrameScheduler},
};
use log::{info, warn};

/// Cancellable next-frame request state for one scene.
#[derive(Debug, Default)]
pub struct FrameLoop {
    active: bool,
    scheduled: Option<u64>,
    generation: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Ask for the next frame. None while inactive.
    pub fn request(&mut self) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.generation += 1;
        self.scheduled = Some(self.generation);
        self.scheduled
    }

    /// Drop the outstanding request, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.scheduled = None;
    }

    /// Gate at the top of the callback body: only the currently
    /// scheduled token of an active loop may run.
    pub fn begin(&mut self, token: u64) -> bool {
        if !self.active || self.scheduled != Some(token) {
            return false;
        }
        self.scheduled = None;
        true
    }
}

pub struct Scene {
    pub name: &'static str,
    pub surface: Box<dyn Surface>,
    pub field: Box<dyn Field>,
    pub sched: FrameScheduler,
    pub fps: FpsCounter,
    looper: FrameLoop,
    pending: Option<u64>,
    /// Orchestrator-owned fade envelope applied on top of quality.
    pub master_alpha: f32,
    /// Set when a frame pass failed and deactivated the scene.
    pub failed: bool,
}

impl Scene {
    pub fn new(
        name: &'static str,
        surface: Box<dyn Surface>,
        field: Box<dyn Field>,
        target_fps: u32,
    ) -> Self {
        Self {
            name,
            surface,
            field,
            sched: FrameScheduler::new(target_fps),
            fps: FpsCounter::new(),
            looper: FrameLoop::new(),
            pending: None,
            master_alpha: 1.0,
            failed: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.looper.is_active()
    }

    /// Discard and recreate the entity collection against the current
    /// surface bounds.
    pub fn reset(&mut self, ctx: &mut Context, snap: &TickSnapshot) {
        let (w, h) = self.surface.size();
        self.field.reset(ctx, snap, w as f32, h as f32);
        self.failed = false;
    }

    /// No-op on an already-active scene.
    pub fn resume(&mut self) {
        if self.looper.is_active() {
            return;
        }
        info!("scene {} resumed", self.name);
        self.looper.activate();
        self.pending = self.looper.request();
    }

    /// Idempotent: pausing twice leaves the same state as pausing once.
    pub fn pause(&mut self) {
        self.looper.deactivate();
        self.looper.cancel();
        self.pending = None;
    }

    /// Teardown: stop the loop, drop entities, shrink the surface to
    /// minimal size.
    pub fn destroy(&mut self) {
        self.pause();
        self.field.clear();
        self.surface.resize(1, 1);
    }

    /// Swap in a freshly created surface after a loss or viewport
    /// change. Entities are rebuilt by the following reset.
    pub fn replace_surface(&mut self, surface: Box<dyn Surface>) {
        self.surface = surface;
    }

    pub fn entity_count(&self) -> usize {
        self.field.entity_count()
    }

    pub fn trim_history(&mut self) {
        self.field.trim_history();
    }

    /// Drive one host redraw callback. Work only happens if the loop
    /// is active, the token is current, and the frame gate opens.
    pub fn pump(&mut self, ctx: &mut Context, snap: &TickSnapshot, tuning: &mut Tuning, now: f64) {
        let Some(token) = self.pending.take() else {
            return;
        };
        if !self.looper.begin(token) {
            return;
        }
        if !self.sched.should_render(now) {
            // too early: reschedule without doing any work
            self.pending = self.looper.request();
            return;
        }
        match self.tick(ctx, snap, now) {
            Ok(()) => {
                self.fps.note(now);
                self.sched.note_frame();
                let avg = self
                    .fps
                    .average()
                    .unwrap_or(self.sched.target_fps as f32);
                self.sched.update_quality(avg, tuning);
                self.pending = self.looper.request();
            }
            Err(e) => {
                // one bad scene must not take the others down
                warn!("scene {} deactivated: {}", self.name, e);
                self.failed = true;
                self.pause();
            }
        }
    }

    fn tick(&mut self, ctx: &mut Context, snap: &TickSnapshot, now: f64) -> Result<(), SplashError> {
        self.surface
            .fade(Rgba::BLACK.with_alpha(snap.fade_alpha))
            .map_err(|e| SplashError::FrameFailed {
                scene: self.name,
                reason: e.to_string(),
            })?;
        self.field.update(ctx, snap, now);
        self.field
            .draw(self.surface.as_mut(), snap, self.master_alpha)
            .map_err(|e| SplashError::FrameFailed {
                scene: self.name,
                reason: e.to_string(),
            })
    }
}
