// spawn.rs
// Random initial population

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use ultraviolet::Vec2;

use crate::body::Body;
use crate::config::SimConfig;

/// Sample a small random velocity, normally distributed per axis with
/// standard deviation `speed`.
pub fn sample_velocity<R: Rng + ?Sized>(rng: &mut R, speed: f32) -> Vec2 {
    let vx: f32 = StandardNormal.sample(rng);
    let vy: f32 = StandardNormal.sample(rng);
    Vec2::new(vx * speed, vy * speed)
}

/// Scatter `config.particle_count` bodies uniformly over the domain with
/// uniformly chosen species.
pub fn add_random<R: Rng + ?Sized>(rng: &mut R, config: &SimConfig) -> Vec<Body> {
    (0..config.particle_count)
        .map(|_| {
            let pos = Vec2::new(
                rng.random_range(0.0..=config.width),
                rng.random_range(0.0..=config.height),
            );
            let species = rng.random_range(0..config.num_species);
            let vel = sample_velocity(rng, config.initial_speed);
            Body::new(pos, vel, config.particle_radius, species)
        })
        .collect()
}
