// commands.rs
// SimCommand messages sent to a running simulation from other threads

use crate::simulation::Simulation;
use ultraviolet::Vec2;

/// Requests from input/render collaborators.
///
/// Commands are queued on the simulation's channel and only applied at the
/// start of the next `step`, before the grid is rebuilt.
#[derive(Clone, Debug, PartialEq)]
pub enum SimCommand {
    /// Replace the rule matrix with a fresh random one.
    RegenerateRules,
    /// Resize the play area.
    SetBounds { width: f32, height: f32 },
    /// Move one body to a point.
    PlaceBody { index: usize, x: f32, y: f32 },
}

/// Process a single SimCommand
pub fn handle_command(cmd: SimCommand, simulation: &mut Simulation) {
    log::trace!("frame {}: handling {:?}", simulation.frame, cmd);
    match cmd {
        SimCommand::RegenerateRules => simulation.regenerate_rules(),
        SimCommand::SetBounds { width, height } => simulation.set_bounds(width, height),
        SimCommand::PlaceBody { index, x, y } => simulation.place_body(index, Vec2::new(x, y)),
    }
}
