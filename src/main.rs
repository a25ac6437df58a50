//
// main.rs
// Mammo-Prep-rs
//
// Binary entry point that hands off execution to the CLI layer.
//
// Thales Matheus Mendonça Santos - November 2025

use mammo_prep::cli;

fn main() -> anyhow::Result<()> {
    cli::run()
}
