// species.rs
// Species rule matrix

use rand::Rng;

use crate::error::{Result, SimError};

/// Index of a species, `0..num_species`.
pub type SpeciesId = usize;

/// Signed interaction strengths between every ordered pair of species.
///
/// `get(a, b)` is the peak force that species `b` exerts on species `a`.
/// The matrix is not symmetric. It is replaced wholesale by `regenerate`
/// and is only ever read while the interaction phase is running.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleMatrix {
    num_species: usize,
    max_force: f32,
    values: Vec<f32>,
}

impl RuleMatrix {
    /// Fill every entry independently and uniformly in `[-max_force, +max_force]`.
    pub fn generate<R: Rng + ?Sized>(
        num_species: usize,
        max_force: f32,
        rng: &mut R,
    ) -> Result<Self> {
        if num_species == 0 {
            return Err(SimError::config("rule matrix needs at least one species"));
        }
        if !max_force.is_finite() || max_force < 0.0 {
            return Err(SimError::config(format!(
                "max_force must be finite and >= 0 (got {max_force})"
            )));
        }
        let mut rules = Self {
            num_species,
            max_force,
            values: vec![0.0; num_species * num_species],
        };
        rules.regenerate(rng);
        Ok(rules)
    }

    /// Replace the entire table with fresh random entries.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let max = self.max_force;
        for v in &mut self.values {
            *v = rng.random_range(-max..=max);
        }
    }

    #[inline]
    pub fn get(&self, a: SpeciesId, b: SpeciesId) -> f32 {
        self.values[a * self.num_species + b]
    }

    /// Overwrite one entry, clamped into `[-max_force, +max_force]`.
    pub fn set(&mut self, a: SpeciesId, b: SpeciesId, value: f32) {
        let max = self.max_force;
        self.values[a * self.num_species + b] = value.clamp(-max, max);
    }

    pub fn num_species(&self) -> usize {
        self.num_species
    }

    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    /// Forces acting on species `a` from every species.
    pub fn row(&self, a: SpeciesId) -> &[f32] {
        let start = a * self.num_species;
        &self.values[start..start + self.num_species]
    }
}
