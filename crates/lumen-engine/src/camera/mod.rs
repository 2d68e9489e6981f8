//! Free-fly camera.
//!
//! Engine space is Z-up: forward is +X, right is -Y, up is +Z. Rotation is kept
//! as Euler angles in degrees (`x` = roll, `y` = pitch, `z` = yaw).

mod free_fly;

pub use free_fly::{Camera, ProjectionMode};
