//! The domain module encapsulates the core of the simulation. It defines the `Swerve`
//! drivetrain and the `Environment` it drives in, along with the geometry, control and physics
//! they are built from.
//!
//! The module has no dependency on the game engine, so the simulation can be stepped and tested
//! on its own.

mod basis;
mod collision;
mod environment;
mod pid;
mod rigidbody;
mod swerve;
mod swerve_module;

pub use basis::{wrap_angle, Angle, Vector2, DIRECTION_EPSILON};
pub use collision::{Bounds, Edges, HasCollision, Rectangle, Segment, Shape, ShapeError};
pub use environment::{Environment, EnvironmentError, Obstacle, ObstacleKind};
pub use pid::{PidController, PidError, PidGains};
pub use rigidbody::{Rigidbody, RigidbodyError};
pub use swerve::{ChassisVelocity, ModuleId, Swerve, SwerveConfig, SwerveError};
pub use swerve_module::{ModuleConfig, SwerveModule};
