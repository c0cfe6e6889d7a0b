// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Global event center and frame-tick timer center, plus the host
//! signal set the orchestrator consumes.
//!
//! Events are one-shot flags keyed by (event, listener). Timers count
//! down in frames at SPLASH_FRAME and emit their event when they hit
//! zero. All state is thread_local: the whole engine runs on one
//! cooperative thread.

use crate::{util::PointF32, SPLASH_FRAME};
use serde::Serialize;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

thread_local! {
    static SPLASH_TIMER: Rc<RefCell<Timers>> = Rc::new(RefCell::new(Timers::new()));
    static EVENT_CENTER: Rc<RefCell<HashMap<String, HashMap<String, bool>>>> =
        Rc::new(RefCell::new(HashMap::new()));
}

/// Lifecycle and input signals, already normalized by the host shell.
/// Each maps 1:1 onto an orchestrator operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostSignal {
    VisibilityChanged { hidden: bool },
    Resized { w: u32, h: u32 },
    SurfaceLost,
    SurfaceRestored,
    SkipRequested,
    ReplayRequested,
    PointerMoved(PointF32),
    PointerLeft,
}

pub fn event_register(event: &str, func: &str) {
    EVENT_CENTER.with(|ec| {
        let mut ec_ref = ec.borrow_mut();
        match ec_ref.get_mut(event) {
            Some(ht) => {
                ht.insert(func.to_string(), false);
            }
            None => {
                let mut h: HashMap<String, bool> = HashMap::new();
                h.insert(func.to_string(), false);
                ec_ref.insert(event.to_string(), h);
            }
        }
    });
}

pub fn event_check(event: &str, func: &str) -> bool {
    EVENT_CENTER.with(|ec| {
        let mut ec_ref = ec.borrow_mut();
        if let Some(ht) = ec_ref.get_mut(event) {
            if let Some(flag) = ht.get_mut(func) {
                if *flag {
                    *flag = false;
                    return true;
                }
            }
        }
        false
    })
}

pub fn event_emit(event: &str) {
    EVENT_CENTER.with(|ec| {
        let mut ec_ref = ec.borrow_mut();
        if let Some(ht) = ec_ref.get_mut(event) {
            for value in ht.values_mut() {
                if !(*value) {
                    *value = true;
                }
            }
        }
    });
}

pub fn timer_register(name: &str, time: f32, func: &str) {
    SPLASH_TIMER.with(|gt| {
        gt.borrow_mut().register(name, time, func);
    });
}

pub fn timer_fire<T>(name: &str, value: T)
where
    T: Serialize,
{
    SPLASH_TIMER.with(|gt| {
        gt.borrow_mut().fire(name, value);
    });
}

pub fn timer_cancel(name: &str, nall: bool) {
    SPLASH_TIMER.with(|gt| {
        gt.borrow_mut().cancel(name, nall);
    });
}

pub fn timer_percent(name: &str) -> f32 {
    SPLASH_TIMER.with(|gt| gt.borrow_mut().percent(name))
}

/// Payload attached by the last fire, for host listeners.
pub fn timer_exdata(name: &str) -> Option<Vec<u8>> {
    SPLASH_TIMER.with(|gt| gt.borrow_mut().exdata(name))
}

pub fn timer_update() {
    SPLASH_TIMER.with(|gt| {
        gt.borrow_mut().update();
    });
}

pub struct Timer {
    time: u32,
    count: u32,
    exdata: Vec<u8>,
}

#[derive(Default)]
pub struct Timers {
    pub timers: HashMap<String, Timer>,
}

impl Timers {
    pub fn new() -> Self {
        Self { ..Self::default() }
    }

    pub fn register(&mut self, name: &str, time: f32, callback: &str) {
        if self.timers.contains_key(name) {
            return;
        }
        let timer = Timer {
            time: 0,
            count: (time * SPLASH_FRAME as f32) as u32,
            exdata: vec![],
        };
        self.timers.insert(name.to_string(), timer);
        event_register(name, callback);
    }

    /// 1.0 right after fire, 0.0 once emitted.
    pub fn percent(&mut self, name: &str) -> f32 {
        match self.timers.get(name) {
            Some(timer) if timer.count > 0 => timer.time as f32 / timer.count as f32,
            _ => 0f32,
        }
    }

    pub fn exdata(&mut self, name: &str) -> Option<Vec<u8>> {
        self.timers.get(name).map(|timer| timer.exdata.clone())
    }

    pub fn fire<T>(&mut self, name: &str, value: T)
    where
        T: Serialize,
    {
        if let Some(timer) = self.timers.get_mut(name) {
            timer.time = timer.count;
            timer.exdata = bincode::serde::encode_to_vec(&value, bincode::config::standard())
                .unwrap_or_default();
        }
    }

    pub fn cancel(&mut self, name: &str, nocall: bool) {
        if let Some(timer) = self.timers.get_mut(name) {
            timer.time = 0;
            if !nocall {
                event_emit(name);
            }
        }
    }

    pub fn update(&mut self) {
        for (name, timer) in &mut self.timers {
            if timer.time > 0 {
                timer.time -= 1;
                if timer.time == 0 {
                    event_emit(name);
                }
            }
        }
    }
}
