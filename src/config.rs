// config.rs
// Centralized configuration for simulation parameters

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// ====================
// Species / Rules
// ====================
pub const NUM_SPECIES: usize = 5;
/// Rule matrix entries are drawn from [-MAX_FORCE, +MAX_FORCE].
pub const MAX_FORCE: f32 = 0.1;

// ====================
// Particles
// ====================
pub const PARTICLE_COUNT: usize = 150;
pub const PARTICLE_RADIUS: f32 = 5.0;
/// Standard deviation of the initial per-axis velocity.
pub const INITIAL_SPEED: f32 = 0.5;

// ====================
// Force Law
// ====================
/// Cutoff distance; also the spatial grid cell size.
pub const MAX_INTERACTION_DISTANCE: f32 = 300.0;
/// Margin added to the radius sum to form the repulsion zone.
pub const REPULSION_DISTANCE: f32 = 10.0;
/// Magnitude of the repulsion at zero separation.
pub const REPULSION_FORCE: f32 = MAX_FORCE;

// ====================
// Spatial Grid
// ====================
/// Upper bound on grid cells. Larger domains get proportionally larger cells.
pub const MAX_GRID_CELLS: usize = 1 << 16;

// ====================
// Integration
// ====================
/// Per-frame multiplicative velocity decay.
pub const FRICTION: f32 = 0.9;

// ====================
// Domain
// ====================
pub const DOMAIN_WIDTH: f32 = 800.0;
pub const DOMAIN_HEIGHT: f32 = 600.0;

// ====================
// Threading/Parallelism
// ====================
pub const MIN_THREADS: usize = 1;

/// How the interaction phase enumerates partners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Uniform grid with a 3x3 neighbourhood search per cell.
    #[default]
    Gridded,
    /// O(n^2) reference path, partitioned by particle index.
    AllPairs,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub num_species: usize,
    pub particle_count: usize,
    pub particle_radius: f32,
    pub max_force: f32,
    pub max_interaction_distance: f32,
    /// Must lie strictly inside (0, 1).
    pub friction: f32,
    pub repulsion_distance: f32,
    pub repulsion_force: f32,
    /// Worker threads for the interaction phase. `None` uses hardware concurrency.
    pub worker_threads: Option<usize>,
    /// Optional ceiling applied after resolving `worker_threads`.
    pub max_worker_threads: Option<usize>,
    pub width: f32,
    pub height: f32,
    pub initial_speed: f32,
    /// Seed for the rule table and initial population. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub interaction_mode: InteractionMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_species: NUM_SPECIES,
            particle_count: PARTICLE_COUNT,
            particle_radius: PARTICLE_RADIUS,
            max_force: MAX_FORCE,
            max_interaction_distance: MAX_INTERACTION_DISTANCE,
            friction: FRICTION,
            repulsion_distance: REPULSION_DISTANCE,
            repulsion_force: REPULSION_FORCE,
            worker_threads: None,
            max_worker_threads: None,
            width: DOMAIN_WIDTH,
            height: DOMAIN_HEIGHT,
            initial_speed: INITIAL_SPEED,
            seed: None,
            interaction_mode: InteractionMode::Gridded,
        }
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::config(format!(
            "{name} must be finite and >= 0 (got {value})"
        )));
    }
    Ok(())
}

fn positive(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::config(format!(
            "{name} must be finite and > 0 (got {value})"
        )));
    }
    Ok(())
}

impl SimConfig {
    /// Reject degenerate configurations before any state is built.
    ///
    /// `worker_threads = Some(0)` is not an error; it is coerced to one
    /// worker when the pool is created.
    pub fn validate(&self) -> Result<()> {
        if self.num_species == 0 {
            return Err(SimError::config("num_species must be > 0"));
        }
        if self.particle_count == 0 {
            return Err(SimError::config("particle_count must be > 0"));
        }
        non_negative("max_force", self.max_force)?;
        non_negative("repulsion_force", self.repulsion_force)?;
        non_negative("repulsion_distance", self.repulsion_distance)?;
        non_negative("particle_radius", self.particle_radius)?;
        non_negative("initial_speed", self.initial_speed)?;
        positive("max_interaction_distance", self.max_interaction_distance)?;
        positive("width", self.width)?;
        positive("height", self.height)?;
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(SimError::config(format!(
                "friction must lie in (0, 1) (got {})",
                self.friction
            )));
        }
        let min_dist = 2.0 * self.particle_radius + self.repulsion_distance;
        if min_dist >= self.max_interaction_distance {
            return Err(SimError::config(format!(
                "repulsion zone ({min_dist}) must be smaller than max_interaction_distance ({})",
                self.max_interaction_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_species_or_particles_fail_fast() {
        let cfg = SimConfig {
            num_species: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));

        let cfg = SimConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn friction_must_be_open_unit_interval() {
        for friction in [0.0, 1.0, -0.5, 1.5, f32::NAN] {
            let cfg = SimConfig {
                friction,
                ..Default::default()
            };
            assert!(cfg.validate().is_err(), "friction {friction} accepted");
        }
    }

    #[test]
    fn zero_worker_threads_is_not_a_config_error() {
        let cfg = SimConfig {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn repulsion_zone_wider_than_cutoff_is_rejected() {
        let cfg = SimConfig {
            particle_radius: 10.0,
            repulsion_distance: 15.0,
            max_interaction_distance: 30.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err}").contains("repulsion zone"));
    }
}
