// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Orchestrator encapsulates the three scenes and implements the main
//! loop. Be aware that scenes, context and tuning all share the same
//! lifetime: the orchestrator owns everything.
//!
//! # Example
//!
//! fn main() {
//!    init_log(log::LevelFilter::Info, "log/splash.log");
//!    let config = SplashConfig::for_device(DeviceClass::Desktop);
//!    let provider = Box::new(MemoryProvider::new(1280, 720));
//!    let mut o = Orchestrator::new(config, provider, Box::new(SystemClock::new()));
//!    o.init();
//!    o.run();
//! }
//!
//! Hosts with their own redraw callback skip run() and call frame()
//! once per callback, plus handle() for every lifecycle signal.

use crate::{
    config::{snapshot, DeviceCaps, SplashConfig, Tuning},
    context::{Clock, Context},
    error::SplashError,
    event::{
        event_check, event_emit, timer_cancel, timer_fire, timer_percent, timer_register,
        timer_update, HostSignal,
    },
    field::{DriftField, LinkedField, MatrixField},
    lifecycle::{LifecycleManager, SETTLE_LISTENER, SETTLE_TIMER},
    render::{
        scene::Scene,
        surface::{DetachedSurface, Surface, SurfaceProvider},
    },
};
use keyframe::{functions::EaseInOut, AnimationSequence};
use log::{info, warn};
use std::{
    cell::RefCell,
    rc::Rc,
    thread,
    time::{Duration, Instant},
};

/// Intro runs this long before the main-site handoff, unless skipped.
pub const INTRO_SECS: f32 = 6.0;

pub const INTRO_TIMER: &str = "splash.intro";
pub const INTRO_LISTENER: &str = "orchestrator.intro";
/// Emitted on every phase change; hosts register listeners on it.
pub const PHASE_EVENT: &str = "splash.phase";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Main,
    Halted,
}

/// Fade-in, hold, fade-out envelope over the normalized intro time.
fn intro_envelope() -> AnimationSequence<f32> {
    let ks = vec![
        (0.0f32, 0.0, EaseInOut).into(),
        (1.0f32, 0.15, EaseInOut).into(),
        (1.0f32, 0.85, EaseInOut).into(),
        (0.0f32, 1.0, EaseInOut).into(),
    ];
    AnimationSequence::from(ks)
}

pub struct Orchestrator {
    pub context: Context,
    pub config: SplashConfig,
    pub tuning: Rc<RefCell<Tuning>>,
    provider: Box<dyn SurfaceProvider>,
    pub intro: Scene,
    pub hero: Scene,
    pub matrix: Scene,
    pub lifecycle: LifecycleManager,
    phase: Phase,
    intro_env: AnimationSequence<f32>,
    /// Set once any surface creation failed; the engine then runs in
    /// zero-entity, no-draw mode instead of failing the host.
    pub degraded: bool,
}

impl Orchestrator {
    pub fn new(
        mut config: SplashConfig,
        mut provider: Box<dyn SurfaceProvider>,
        clock: Box<dyn Clock>,
    ) -> Self {
        config.sanitize();
        let tuning = Rc::new(RefCell::new(Tuning::from_config(&config)));
        let context = Context::new(clock);
        let lifecycle = LifecycleManager::new();
        timer_register(INTRO_TIMER, INTRO_SECS, INTRO_LISTENER);

        let (vw, vh) = provider.viewport();
        let mut degraded = false;
        let mut surface = |degraded: &mut bool| -> Box<dyn Surface> {
            match provider.create(vw.max(1), vh.max(1)) {
                Ok(s) => s,
                Err(e) => {
                    warn!("surface unavailable, degrading: {e}");
                    *degraded = true;
                    Box::new(DetachedSurface)
                }
            }
        };
        let intro_surface = surface(&mut degraded);
        let hero_surface = surface(&mut degraded);
        let matrix_surface = surface(&mut degraded);

        let fps = config.target_fps;
        Self {
            context,
            intro: Scene::new("intro", intro_surface, Box::new(DriftField::new()), fps),
            hero: Scene::new("hero", hero_surface, Box::new(LinkedField::new()), fps),
            matrix: Scene::new("matrix", matrix_surface, Box::new(MatrixField::new()), fps),
            config,
            tuning,
            provider,
            lifecycle,
            phase: Phase::Intro,
            intro_env: intro_envelope(),
            degraded,
        }
    }

    /// Build the intro field and start the sequence.
    pub fn init(&mut self) {
        info!("init splash...");
        if self.degraded {
            self.tuning.borrow_mut().detach();
        }
        let snap = snapshot(&self.config, &self.tuning.borrow());
        self.intro.reset(&mut self.context, &snap);
        self.start_intro();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn scenes(&mut self) -> [&mut Scene; 3] {
        [&mut self.intro, &mut self.hero, &mut self.matrix]
    }

    fn fresh_surface_at(&mut self, w: u32, h: u32) -> Box<dyn Surface> {
        match self.provider.create(w.max(1), h.max(1)) {
            Ok(s) => s,
            Err(e) => {
                warn!("surface unavailable, degrading: {e}");
                self.degraded = true;
                self.tuning.borrow_mut().detach();
                Box::new(DetachedSurface)
            }
        }
    }

    fn fresh_surface(&mut self) -> Box<dyn Surface> {
        let (w, h) = self.provider.viewport();
        self.fresh_surface_at(w, h)
    }

    fn start_intro(&mut self) {
        self.phase = Phase::Intro;
        self.intro.master_alpha = 0.0;
        self.intro_env.advance_to(0.0);
        timer_fire(INTRO_TIMER, 0u8);
        self.intro.resume();
        event_emit(PHASE_EVENT);
    }

    /// Intro is done (timer or skip): tear it down, bring up the main
    /// scenes.
    fn handoff(&mut self) {
        info!("intro complete, revealing main scenes");
        self.intro.destroy();
        let hs = self.fresh_surface();
        self.hero.replace_surface(hs);
        let ms = self.fresh_surface();
        self.matrix.replace_surface(ms);
        let snap = snapshot(&self.config, &self.tuning.borrow());
        self.hero.reset(&mut self.context, &snap);
        self.matrix.reset(&mut self.context, &snap);
        self.hero.master_alpha = 1.0;
        self.matrix.master_alpha = 1.0;
        self.hero.resume();
        self.matrix.resume();
        self.phase = Phase::Main;
        event_emit(PHASE_EVENT);
    }

    /// Drive one host redraw callback. Values every scene reads are
    /// snapshotted here, at the top of the tick.
    pub fn frame(&mut self) {
        if self.phase == Phase::Halted || self.lifecycle.hidden {
            return;
        }
        let now = self.context.now();
        self.context.stage += 1;
        timer_update();
        if event_check(SETTLE_TIMER, SETTLE_LISTENER) {
            self.resume_phase();
        }
        if event_check(INTRO_TIMER, INTRO_LISTENER) && self.phase == Phase::Intro {
            self.handoff();
        }
        let snap = snapshot(&self.config, &self.tuning.borrow());
        match self.phase {
            Phase::Intro => {
                let progress = (1.0 - timer_percent(INTRO_TIMER)) as f64;
                self.intro_env.advance_to(progress);
                self.intro.master_alpha = self.intro_env.now();
                let mut tuning = self.tuning.borrow_mut();
                self.intro.pump(&mut self.context, &snap, &mut tuning, now);
            }
            Phase::Main => {
                let mut tuning = self.tuning.borrow_mut();
                self.hero.pump(&mut self.context, &snap, &mut tuning, now);
                self.matrix.pump(&mut self.context, &snap, &mut tuning, now);
            }
            Phase::Halted => {}
        }
        self.lifecycle
            .maintain(now, &mut [&mut self.intro, &mut self.hero, &mut self.matrix]);
    }

    /// Host lifecycle signals, each mapped onto one operation.
    pub fn handle(&mut self, signal: HostSignal) {
        match signal {
            HostSignal::VisibilityChanged { hidden } => {
                let now = self.context.now();
                self.lifecycle.on_visibility(
                    hidden,
                    now,
                    &mut [&mut self.intro, &mut self.hero, &mut self.matrix],
                );
            }
            HostSignal::Resized { w, h } => self.on_resized(w, h),
            HostSignal::SurfaceLost => {
                self.lifecycle
                    .on_surface_lost(&mut [&mut self.intro, &mut self.hero, &mut self.matrix]);
            }
            HostSignal::SurfaceRestored => {
                self.lifecycle.on_surface_restored();
                self.rebuild_phase_surfaces();
                self.resume_phase();
            }
            HostSignal::SkipRequested => self.skip(),
            HostSignal::ReplayRequested => self.replay(),
            HostSignal::PointerMoved(p) => {
                if self.config.caps().contains(DeviceCaps::POINTER) {
                    self.context.pointer = Some(p);
                }
            }
            HostSignal::PointerLeft => self.context.pointer = None,
        }
    }

    /// Viewport changes recreate surfaces and rebuild entities; a
    /// surface is never resized in place.
    fn on_resized(&mut self, w: u32, h: u32) {
        if self.phase == Phase::Halted {
            return;
        }
        info!("viewport resized to {w}x{h}");
        let snap = snapshot(&self.config, &self.tuning.borrow());
        match self.phase {
            Phase::Intro => {
                let s = self.fresh_surface_at(w, h);
                self.intro.replace_surface(s);
                self.intro.reset(&mut self.context, &snap);
            }
            Phase::Main => {
                let s = self.fresh_surface_at(w, h);
                self.hero.replace_surface(s);
                self.hero.reset(&mut self.context, &snap);
                let s = self.fresh_surface_at(w, h);
                self.matrix.replace_surface(s);
                self.matrix.reset(&mut self.context, &snap);
            }
            Phase::Halted => {}
        }
    }

    fn rebuild_phase_surfaces(&mut self) {
        let (w, h) = self.provider.viewport();
        match self.phase {
            Phase::Intro => {
                let s = self.fresh_surface_at(w, h);
                self.intro.replace_surface(s);
            }
            Phase::Main => {
                let s = self.fresh_surface_at(w, h);
                self.hero.replace_surface(s);
                let s = self.fresh_surface_at(w, h);
                self.matrix.replace_surface(s);
            }
            Phase::Halted => {}
        }
    }

    /// Resume whichever phase was active, resetting first if the
    /// lifecycle demanded it (long hide, surface restoration).
    fn resume_phase(&mut self) {
        if self.lifecycle.hidden || self.lifecycle.surface_lost {
            return;
        }
        if self.lifecycle.take_needs_reset() {
            let snap = snapshot(&self.config, &self.tuning.borrow());
            match self.phase {
                Phase::Intro => self.intro.reset(&mut self.context, &snap),
                Phase::Main => {
                    self.hero.reset(&mut self.context, &snap);
                    self.matrix.reset(&mut self.context, &snap);
                }
                Phase::Halted => {}
            }
        }
        match self.phase {
            Phase::Intro => self.intro.resume(),
            Phase::Main => {
                self.hero.resume();
                self.matrix.resume();
            }
            Phase::Halted => {}
        }
    }

    /// Jump straight to the main scenes.
    pub fn skip(&mut self) {
        if self.phase == Phase::Intro {
            info!("intro skipped");
            timer_cancel(INTRO_TIMER, true);
            self.handoff();
        }
    }

    /// Tear the main scenes down and run the intro again.
    pub fn replay(&mut self) {
        if self.phase == Phase::Halted {
            return;
        }
        info!("replay requested");
        self.hero.destroy();
        self.matrix.destroy();
        timer_cancel(INTRO_TIMER, true);
        let s = self.fresh_surface();
        self.intro.replace_surface(s);
        let snap = snapshot(&self.config, &self.tuning.borrow());
        self.intro.reset(&mut self.context, &snap);
        self.start_intro();
    }

    /// Full teardown; the orchestrator is inert afterwards.
    pub fn destroy(&mut self) {
        info!("splash destroyed");
        timer_cancel(INTRO_TIMER, true);
        timer_cancel(SETTLE_TIMER, true);
        for scene in self.scenes() {
            scene.destroy();
        }
        self.phase = Phase::Halted;
    }

    /// Convenience fixed-tick loop for native hosts without their own
    /// redraw callback. Web-style hosts call frame() directly instead.
    pub fn run(&mut self) -> Result<(), SplashError> {
        info!("Begin run...");
        let tick_rate = Duration::from_nanos(1_000_000_000 / self.config.target_fps.max(1) as u64);
        let mut last_tick = Instant::now();
        while self.phase != Phase::Halted {
            self.frame();
            if let Some(remain) = tick_rate.checked_sub(last_tick.elapsed()) {
                thread::sleep(remain);
            }
            last_tick = Instant::now();
        }
        Ok(())
    }
}
