//! Session layer: world state, per-tick step function, level lifecycle.

pub mod event;
pub mod level;
pub mod save;
pub mod step;
pub mod world;
