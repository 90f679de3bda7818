// simulation/simulation.rs
// Contains the Simulation struct, the per-frame state machine and the integrator

use crossbeam::channel::{self, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::SmallVec;
use ultraviolet::Vec2;

use super::force_law::{ForceLaw, ForceProfile};
use super::forces::{InteractionContext, InteractionEngine};
use crate::body::{Body, BodyView};
use crate::cell_list::CellList;
use crate::commands::{self, SimCommand};
use crate::config::{InteractionMode, SimConfig};
use crate::error::{Result, SimError};
use crate::partition;
use crate::profile_scope;
use crate::spawn;
use crate::species::RuleMatrix;

/// An external point that pulls (positive strength) or pushes (negative)
/// every body within the interaction cutoff, e.g. a cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointInfluence {
    pub position: Vec2,
    pub strength: f32,
}

/// The main simulation state.
///
/// A frame runs `apply queued commands -> rebuild grid -> interact (fork-join)
/// -> integrate`. Everything that changes the rules, the bounds or body
/// positions from outside is deferred to the start of the next frame.
pub struct Simulation {
    pub frame: u64,
    bodies: Vec<Body>,
    rules: RuleMatrix,
    law: ForceLaw,
    cell_list: CellList,
    engine: InteractionEngine,
    deltas: Vec<Vec2>,
    config: SimConfig,
    width: f32,
    height: f32,
    rng: StdRng,
    pending_rules: bool,
    pending_bounds: Option<(f32, f32)>,
    pending_moves: Vec<(usize, Vec2)>,
    command_tx: Sender<SimCommand>,
    command_rx: Receiver<SimCommand>,
}

impl Simulation {
    /// Random rules and a random population, both drawn from `config.seed`
    /// when it is set.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let bodies = spawn::add_random(&mut rng, &config);
        Self::assemble(config, bodies, rng)
    }

    /// Use an explicit population instead of a random one. The rule matrix
    /// is still random.
    pub fn with_bodies(mut config: SimConfig, bodies: Vec<Body>) -> Result<Self> {
        config.particle_count = bodies.len();
        config.validate()?;
        if let Some(b) = bodies.iter().find(|b| b.species >= config.num_species) {
            return Err(SimError::config(format!(
                "body species {} out of range for {} species",
                b.species, config.num_species
            )));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::assemble(config, bodies, rng)
    }

    fn assemble(config: SimConfig, bodies: Vec<Body>, mut rng: StdRng) -> Result<Self> {
        let rules = RuleMatrix::generate(config.num_species, config.max_force, &mut rng)?;
        let law = ForceLaw::new(
            config.repulsion_distance,
            config.repulsion_force,
            config.max_interaction_distance,
        );
        let workers =
            partition::resolve_worker_count(config.worker_threads, config.max_worker_threads);
        let engine = InteractionEngine::new(workers)?;
        let cell_list = CellList::new(config.width, config.height, config.max_interaction_distance);
        let (command_tx, command_rx) = channel::unbounded();

        log::info!(
            "simulation: {} bodies, {} species, {}x{} domain, {} workers, {:?} interaction",
            bodies.len(),
            config.num_species,
            config.width,
            config.height,
            workers,
            config.interaction_mode
        );

        Ok(Self {
            frame: 0,
            deltas: vec![Vec2::zero(); bodies.len()],
            bodies,
            rules,
            law,
            cell_list,
            engine,
            width: config.width,
            height: config.height,
            config,
            rng,
            pending_rules: false,
            pending_bounds: None,
            pending_moves: Vec::new(),
            command_tx,
            command_rx,
        })
    }

    /// Advance one frame.
    pub fn step(&mut self, influences: &[PointInfluence]) {
        profile_scope!("simulation_step");
        self.apply_frame_boundary();
        self.interact();
        self.integrate(influences);
        self.frame += 1;
    }

    /// Drain queued commands, then apply deferred rule, bounds and
    /// placement changes. Runs strictly between frames.
    fn apply_frame_boundary(&mut self) {
        let queued: Vec<SimCommand> = self.command_rx.try_iter().collect();
        for cmd in queued {
            commands::handle_command(cmd, self);
        }

        if std::mem::take(&mut self.pending_rules) {
            self.rules.regenerate(&mut self.rng);
            log::debug!(
                "frame {}: rule matrix regenerated (max force {})",
                self.frame,
                self.rules.max_force()
            );
        }
        if let Some((width, height)) = self.pending_bounds.take() {
            self.width = width;
            self.height = height;
            self.cell_list.update_domain_size(width, height);
            log::debug!(
                "frame {}: bounds set to {}x{}, grid {:?}",
                self.frame,
                width,
                height,
                self.cell_list.grid_size()
            );
        }
        for (index, pos) in std::mem::take(&mut self.pending_moves) {
            match self.bodies.get_mut(index) {
                Some(body) => body.pos = pos,
                None => log::warn!("place_body: no body {index} (have {})", self.bodies.len()),
            }
        }
    }

    /// Rebuild the grid and run the interaction phase, adding each body's
    /// velocity delta to its velocity. Returns the deltas, indexed like
    /// `bodies()`.
    pub fn interact(&mut self) -> &[Vec2] {
        {
            profile_scope!("build_grid");
            self.cell_list.rebuild(&self.bodies);
        }

        profile_scope!("interact");
        self.deltas.resize(self.bodies.len(), Vec2::zero());
        let ctx = InteractionContext {
            bodies: &self.bodies,
            rules: &self.rules,
            law: &self.law,
        };
        match self.config.interaction_mode {
            InteractionMode::Gridded => {
                self.engine
                    .accumulate_gridded(ctx, &self.cell_list, &mut self.deltas)
            }
            InteractionMode::AllPairs => self.engine.accumulate_all_pairs(ctx, &mut self.deltas),
        }

        for (body, dv) in self.bodies.iter_mut().zip(&self.deltas) {
            body.vel += *dv;
        }
        &self.deltas
    }

    /// Sequential integration: external influences, move, friction, then
    /// reflect off the domain edges.
    pub fn integrate(&mut self, influences: &[PointInfluence]) {
        profile_scope!("integrate");
        let friction = self.config.friction;
        let (width, height) = (self.width, self.height);
        let profiles: SmallVec<[(Vec2, ForceProfile); 2]> = influences
            .iter()
            .map(|inf| (inf.position, self.law.influence_profile(inf.strength)))
            .collect();

        let mut reset = 0usize;
        for body in &mut self.bodies {
            for (point, profile) in &profiles {
                let d = *point - body.pos;
                let dist = d.mag();
                if dist > 0.0 {
                    body.vel += d * (profile.eval(dist) / dist);
                }
            }

            body.pos += body.vel;
            body.vel *= friction;

            if !body.is_finite() {
                body.pos = Vec2::zero();
                body.vel = Vec2::zero();
                reset += 1;
            }
            reflect(&mut body.pos.x, &mut body.vel.x, width);
            reflect(&mut body.pos.y, &mut body.vel.y, height);
        }

        if reset > 0 {
            log::warn!("frame {}: reset {} bodies with non-finite state", self.frame, reset);
        }
    }

    /// Ask for a new random rule matrix at the next frame boundary.
    pub fn regenerate_rules(&mut self) {
        self.pending_rules = true;
    }

    /// Resize the domain from the next grid rebuild on. Bodies left outside
    /// are clamped by the next integration.
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("ignoring invalid bounds {width}x{height}");
            return;
        }
        self.pending_bounds = Some((width, height));
    }

    /// Move body `index` to `pos` at the next frame boundary.
    pub fn place_body(&mut self, index: usize, pos: Vec2) {
        self.pending_moves.push((index, pos));
    }

    /// Queue handle for other threads. Commands are applied at the start of
    /// the next `step`.
    pub fn command_sender(&self) -> Sender<SimCommand> {
        self.command_tx.clone()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn views(&self) -> impl Iterator<Item = BodyView> + '_ {
        self.bodies.iter().map(Body::view)
    }

    pub fn rules(&self) -> &RuleMatrix {
        &self.rules
    }

    /// Direct access for scripted setups. Only reachable between frames.
    pub fn rules_mut(&mut self) -> &mut RuleMatrix {
        &mut self.rules
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.engine.workers()
    }

    /// Bodies left out of the grid in the last interaction phase.
    pub fn excluded_last_frame(&self) -> usize {
        self.cell_list.excluded()
    }
}

/// Clamp one axis to `[0, bound]`, flipping the velocity when it hits.
#[inline]
fn reflect(pos: &mut f32, vel: &mut f32, bound: f32) {
    if *pos < 0.0 {
        *pos = 0.0;
        *vel = -*vel;
    } else if *pos > bound {
        *pos = bound;
        *vel = -*vel;
    }
}
