// app/simulation_loop.rs
// Frame loop and shared frame publication

use parking_lot::Mutex;
use std::sync::Arc;

use crate::body::BodyView;
use crate::init_config::RunConfig;
use crate::profile_scope;
use crate::simulation::Simulation;

/// Latest published frame, for renderers on other threads.
#[derive(Clone, Debug, Default)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub bounds: (f32, f32),
    pub bodies: Vec<BodyView>,
}

#[derive(Clone, Default)]
pub struct SharedFrame {
    inner: Arc<Mutex<FrameSnapshot>>,
}

impl SharedFrame {
    /// Copy the draw data of a finished frame.
    pub fn publish(&self, simulation: &Simulation) {
        let mut lock = self.inner.lock();
        lock.frame = simulation.frame;
        lock.bounds = simulation.bounds();
        lock.bodies.clear();
        lock.bodies.extend(simulation.views());
    }

    pub fn frame(&self) -> u64 {
        self.inner.lock().frame
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        self.inner.lock().clone()
    }
}

/// Aggregate numbers logged by the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSummary {
    pub mean_speed: f32,
    pub species_counts: Vec<usize>,
}

pub fn summarize(simulation: &Simulation) -> FrameSummary {
    let bodies = simulation.bodies();
    let mut species_counts = vec![0; simulation.rules().num_species()];
    let mut speed = 0.0;
    for b in bodies {
        species_counts[b.species] += 1;
        speed += b.vel.mag();
    }
    FrameSummary {
        mean_speed: if bodies.is_empty() {
            0.0
        } else {
            speed / bodies.len() as f32
        },
        species_counts,
    }
}

pub fn run_simulation_loop(mut simulation: Simulation, run: &RunConfig, shared: &SharedFrame) {
    loop {
        if run.frames.is_some_and(|limit| simulation.frame >= limit) {
            break;
        }
        {
            profile_scope!("simulation_loop");
            simulation.step(&[]);
        }
        shared.publish(&simulation);

        if run.log_every > 0 && simulation.frame % run.log_every == 0 {
            let summary = summarize(&simulation);
            log::info!(
                "frame {}: mean speed {:.4}, species {:?}, excluded {}",
                simulation.frame,
                summary.mean_speed,
                summary.species_counts,
                simulation.excluded_last_frame()
            );
            #[cfg(feature = "profiling")]
            crate::PROFILER.lock().log_and_clear();
        }
    }
    log::info!("simulation finished after {} frames", simulation.frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn config() -> SimConfig {
        SimConfig {
            particle_count: 40,
            num_species: 4,
            worker_threads: Some(2),
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn loop_stops_at_frame_limit_and_publishes() {
        let simulation = Simulation::new(config()).unwrap();
        let shared = SharedFrame::default();
        let run = RunConfig {
            frames: Some(5),
            log_every: 2,
            regenerate_every: None,
        };
        run_simulation_loop(simulation, &run, &shared);

        let snap = shared.snapshot();
        assert_eq!(snap.frame, 5);
        assert_eq!(snap.bodies.len(), 40);
        assert_eq!(snap.bounds, (800.0, 600.0));
    }

    #[test]
    fn summary_counts_every_body() {
        let simulation = Simulation::new(config()).unwrap();
        let summary = summarize(&simulation);
        assert_eq!(summary.species_counts.len(), 4);
        assert_eq!(summary.species_counts.iter().sum::<usize>(), 40);
        assert!(summary.mean_speed >= 0.0);
    }
}
