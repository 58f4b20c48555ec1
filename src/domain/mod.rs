//! Pure grid rules. Nothing here knows about time sources, terminals or files.

pub mod ai;
pub mod collision;
pub mod entity;
pub mod grid;
pub mod maze;
pub mod movement;
