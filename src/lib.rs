//! Lucy's Maze: a slide-maze arcade.
//!
//! - `domain`: pure grid rules (maze generation, collision, slide policy, hazards)
//! - `sim`: the session state machine driven by ticks and input
//! - `config`: `config.toml` loader with defaults
//!
//! The terminal front-end lives in the binary; this crate only produces
//! positions and `GameEvent`s.

pub mod config;
pub mod domain;
pub mod sim;
