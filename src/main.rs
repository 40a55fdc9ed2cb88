use std::{error::Error, time::Duration};

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};


mod controller;
mod domain;
mod resource;
mod simulator;

use domain::{Angle, Environment, Swerve, SwerveConfig};

const FIELD_WIDTH: f64 = 10.0;
const FIELD_HEIGHT: f64 = 10.0;
const RNG_SEED: u64 = 19878367467712;
const ROCKS: usize = 3;

fn main() -> Result<(), Box<dyn Error>> {
    let environment = Environment::new(FIELD_WIDTH, FIELD_HEIGHT)?;
    let swerve = Swerve::new(environment.center(), Angle::ZERO, SwerveConfig::default())?;

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(resource::SwerveRes::from(swerve))
        .insert_resource(resource::EnvironmentRes::from(environment))
        .insert_resource(simulator::RockSpawner::new(RNG_SEED, ROCKS))
        .add_plugins(controller::Controller)
        .add_plugins(simulator::Simulator)
        .run();

    Ok(())
}
