// src/lib.rs
//
// ferrodomain: convert ferroelectric / phase-field sample files into legacy-VTK
// grids and classify domains.

pub mod classify;
pub mod color;
pub mod config;
pub mod domain_grid;
pub mod error;
pub mod grid;
pub mod loader;
pub mod orientation;
pub mod stats;
pub mod table;
pub mod vec3;
pub mod vtk;
pub mod workflow;

pub use error::{GridError, Result};

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter (`info`, `debug` for this crate).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ferrodomain=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}
