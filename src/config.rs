// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Splash configuration and the shared adaptive tuning state.
//!
//! SplashConfig is the host-supplied startup input. Tuning carries the
//! values the quality loop is allowed to mutate at runtime (quality
//! scalar, live entity counts, live connection distance). Scenes never
//! read either directly while ticking: they get a TickSnapshot copied
//! at the top of the tick, so a mid-frame mutation is never observed.

use crate::error::SplashError;
use bitflags::bitflags;
use log::warn;
use serde::{Deserialize, Serialize};

/// Entity-count floors the adaptive loop may never shrink below.
pub const DRIFT_MIN: usize = 24;
pub const LINKED_MIN: usize = 16;
pub const COLUMN_MIN: usize = 8;

bitflags! {
    /// What a device class is allowed to render.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct DeviceCaps: u8 {
        const POINTER     = 0b0001;
        const TRAILS      = 0b0010;
        const CONNECTIONS = 0b0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplashConfig {
    pub particle_count: u32,
    pub connection_distance: f32,
    pub max_connections: u32,
    pub target_fps: u32,
    pub reduced_motion: bool,
    pub device_class: DeviceClass,
    pub spatial_optimization_enabled: bool,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self::for_device(DeviceClass::Desktop)
    }
}

impl SplashConfig {
    /// Per-device preset in the shape hosts usually start from.
    pub fn for_device(device: DeviceClass) -> Self {
        let (particle_count, connection_distance) = match device {
            DeviceClass::Desktop => (140, 120.0),
            DeviceClass::Tablet => (90, 110.0),
            DeviceClass::Mobile => (60, 90.0),
        };
        Self {
            particle_count,
            connection_distance,
            max_connections: 5,
            target_fps: 60,
            reduced_motion: false,
            device_class: device,
            spatial_optimization_enabled: true,
        }
    }

    /// Parse a TOML snippet, then clamp-and-warn like set-time config.
    pub fn from_toml_str(s: &str) -> Result<Self, SplashError> {
        let mut cfg: SplashConfig =
            toml::from_str(s).map_err(|e| SplashError::ConfigInvalid(e.to_string()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Clamp every field to its nearest valid value. Policy is
    /// clamp-and-warn, applied uniformly at this one boundary.
    pub fn sanitize(&mut self) {
        if self.particle_count > 4000 {
            warn!("particle_count {} clamped to 4000", self.particle_count);
            self.particle_count = 4000;
        }
        if !(self.connection_distance > 0.0) || !self.connection_distance.is_finite() {
            warn!(
                "connection_distance {} clamped to 120",
                self.connection_distance
            );
            self.connection_distance = 120.0;
        }
        if self.max_connections > 32 {
            warn!("max_connections {} clamped to 32", self.max_connections);
            self.max_connections = 32;
        }
        if self.target_fps == 0 {
            warn!("target_fps 0 replaced with 60");
            self.target_fps = 60;
        } else if self.target_fps > 240 {
            warn!("target_fps {} clamped to 240", self.target_fps);
            self.target_fps = 240;
        }
    }

    pub fn caps(&self) -> DeviceCaps {
        let mut caps = match self.device_class {
            DeviceClass::Desktop => DeviceCaps::POINTER | DeviceCaps::TRAILS | DeviceCaps::CONNECTIONS,
            DeviceClass::Tablet => DeviceCaps::POINTER | DeviceCaps::CONNECTIONS,
            DeviceClass::Mobile => DeviceCaps::CONNECTIONS,
        };
        // no pointer forces under reduced motion, the field should sit still
        if self.reduced_motion {
            caps.remove(DeviceCaps::POINTER);
        }
        caps
    }

    /// Alpha of the per-frame fade fill. Constrained devices clear
    /// faster, which keeps overdraw trails short and cheap.
    pub fn fade_alpha(&self) -> f32 {
        match self.device_class {
            DeviceClass::Desktop => 0.08,
            DeviceClass::Tablet => 0.12,
            DeviceClass::Mobile => 0.2,
        }
    }

    pub fn trail_cap(&self) -> usize {
        match self.device_class {
            DeviceClass::Desktop => 10,
            DeviceClass::Tablet => 6,
            DeviceClass::Mobile => 4,
        }
    }

    pub fn glyph_cap(&self) -> usize {
        match self.device_class {
            DeviceClass::Desktop => 24,
            DeviceClass::Tablet => 18,
            DeviceClass::Mobile => 12,
        }
    }

    pub fn pointer_influence(&self) -> f32 {
        match self.device_class {
            DeviceClass::Desktop => 140.0,
            DeviceClass::Tablet => 110.0,
            DeviceClass::Mobile => 0.0,
        }
    }

    fn drift_count(&self) -> usize {
        self.particle_count as usize
    }

    fn linked_count(&self) -> usize {
        (self.particle_count as usize * 3 / 4).max(LINKED_MIN)
    }

    fn column_budget(&self) -> usize {
        match self.device_class {
            DeviceClass::Desktop => 48,
            DeviceClass::Tablet => 32,
            DeviceClass::Mobile => 20,
        }
    }
}

/// Runtime-mutable shared state. Mutated only by the quality loop and
/// the lifecycle reset paths, read through TickSnapshot everywhere else.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub quality: f32,
    pub drift_count: usize,
    pub linked_count: usize,
    pub column_count: usize,
    pub connection_distance: f32,
    connection_floor: f32,
}

impl Tuning {
    pub fn from_config(cfg: &SplashConfig) -> Self {
        Self {
            quality: 1.0,
            drift_count: cfg.drift_count(),
            linked_count: cfg.linked_count(),
            column_count: cfg.column_budget(),
            connection_distance: cfg.connection_distance,
            connection_floor: cfg.connection_distance * 0.5,
        }
    }

    /// Degrade step: shrink counts and search radius by `factor`,
    /// honoring every family floor.
    pub fn degrade(&mut self, factor: f32) {
        self.drift_count = ((self.drift_count as f32 * factor) as usize).max(DRIFT_MIN);
        self.linked_count = ((self.linked_count as f32 * factor) as usize).max(LINKED_MIN);
        self.column_count = ((self.column_count as f32 * factor) as usize).max(COLUMN_MIN);
        self.connection_distance =
            (self.connection_distance * factor).max(self.connection_floor);
    }

    /// Zero-entity mode for a host that could not hand us a surface.
    pub fn detach(&mut self) {
        self.drift_count = 0;
        self.linked_count = 0;
        self.column_count = 0;
    }
}

/// Per-tick copy of everything a scene reads while updating/drawing.
#[derive(Debug, Clone, Copy)]
pub struct TickSnapshot {
    pub quality: f32,
    pub drift_count: usize,
    pub linked_count: usize,
    pub column_count: usize,
    pub connection_distance: f32,
    pub max_connections: usize,
    pub reduced_motion: bool,
    pub caps: DeviceCaps,
    pub fade_alpha: f32,
    pub trail_cap: usize,
    pub glyph_cap: usize,
    pub pointer_influence: f32,
    pub spatial_index: bool,
}

pub fn snapshot(cfg: &SplashConfig, tuning: &Tuning) -> TickSnapshot {
    TickSnapshot {
        quality: tuning.quality,
        drift_count: tuning.drift_count,
        linked_count: tuning.linked_count,
        column_count: tuning.column_count,
        connection_distance: tuning.connection_distance,
        max_connections: cfg.max_connections as usize,
        reduced_motion: cfg.reduced_motion,
        caps: cfg.caps(),
        fade_alpha: cfg.fade_alpha(),
        trail_cap: cfg.trail_cap(),
        glyph_cap: cfg.glyph_cap(),
        pointer_influence: cfg.pointer_influence(),
        spatial_index: cfg.spatial_optimization_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_to_nearest_valid() {
        let mut cfg = SplashConfig::default();
        cfg.connection_distance = -5.0;
        cfg.target_fps = 0;
        cfg.max_connections = 999;
        cfg.sanitize();
        assert_eq!(cfg.connection_distance, 120.0);
        assert_eq!(cfg.target_fps, 60);
        assert_eq!(cfg.max_connections, 32);
    }

    #[test]
    fn test_from_toml() {
        let cfg = SplashConfig::from_toml_str(
            r#"
            particle_count = 80
            target_fps = 30
            device_class = "tablet"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.particle_count, 80);
        assert_eq!(cfg.target_fps, 30);
        assert_eq!(cfg.device_class, DeviceClass::Tablet);
        // defaults fill the rest
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(SplashConfig::from_toml_str("particle_count = \"many\"").is_err());
    }

    #[test]
    fn test_mobile_has_no_pointer() {
        let cfg = SplashConfig::for_device(DeviceClass::Mobile);
        assert!(!cfg.caps().contains(DeviceCaps::POINTER));
        let mut desk = SplashConfig::default();
        assert!(desk.caps().contains(DeviceCaps::POINTER));
        desk.reduced_motion = true;
        assert!(!desk.caps().contains(DeviceCaps::POINTER));
    }

    #[test]
    fn test_degrade_floors() {
        let cfg = SplashConfig::default();
        let mut t = Tuning::from_config(&cfg);
        for _ in 0..100 {
            t.degrade(0.9);
        }
        assert_eq!(t.drift_count, DRIFT_MIN);
        assert_eq!(t.linked_count, LINKED_MIN);
        assert_eq!(t.column_count, COLUMN_MIN);
        assert!(t.connection_distance >= cfg.connection_distance * 0.5);
    }
}
