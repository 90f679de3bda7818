// main.rs
// Binary entry point for the headless runner

fn main() {
    if let Err(e) = particle_life::app::run() {
        log::error!("{e}");
        eprintln!("particle_life: {e}");
        std::process::exit(1);
    }
}
