// body/types.rs
// Contains the Body struct and the read-only view handed to renderers

use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use crate::species::SpeciesId;

/// A point-like particle.
///
/// Bodies keep their index for the lifetime of a simulation. Only the
/// integrator moves them; the interaction phase only adds to `vel`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub species: SpeciesId,
}

/// What a renderer needs to draw one body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyView {
    pub pos: Vec2,
    pub radius: f32,
    pub species: SpeciesId,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32, species: SpeciesId) -> Self {
        Self {
            pos,
            vel,
            radius,
            species,
        }
    }

    /// Body at rest.
    pub fn at_rest(pos: Vec2, radius: f32, species: SpeciesId) -> Self {
        Self::new(pos, Vec2::zero(), radius, species)
    }

    pub fn view(&self) -> BodyView {
        BodyView {
            pos: self.pos,
            radius: self.radius,
            species: self.species,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.x.is_finite()
            && self.pos.y.is_finite()
            && self.vel.x.is_finite()
            && self.vel.y.is_finite()
    }
}
