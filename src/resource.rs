//! Bevy resources wrapping domain entities.
//!
//! The domain stays free of engine types. Each wrapper dereferences to the wrapped entity, so
//! systems call domain methods directly on `Res` and `ResMut`.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;

use crate::domain;

/// The simulated drivetrain.
#[derive(Resource)]
pub struct SwerveRes(domain::Swerve);

impl Deref for SwerveRes {
    type Target = domain::Swerve;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SwerveRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::Swerve> for SwerveRes {
    fn from(swerve: domain::Swerve) -> Self {
        Self(swerve)
    }
}

/// Field with rocks, pellets, and debris.
#[derive(Resource)]
pub struct EnvironmentRes(domain::Environment);

impl Deref for EnvironmentRes {
    type Target = domain::Environment;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for EnvironmentRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::Environment> for EnvironmentRes {
    fn from(environment: domain::Environment) -> Self {
        Self(environment)
    }
}
