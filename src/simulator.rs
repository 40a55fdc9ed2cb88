//! Simulation of the drivetrain on a field with drifting rocks.
//!
//! The drivetrain is driven and updated with the elapsed frame time until it hits a rock. The
//! hit destroys it: its outline shatters into debris and it is no longer driven. Rocks fly
//! across the field and are replaced once they leave it or a pellet shatters them.

use std::f64::consts::TAU;

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    controller::DriveCommand,
    domain::{Angle, Environment, EnvironmentError, Obstacle, Rigidbody, Shape, Vector2},
    resource::{EnvironmentRes, SwerveRes},
};

const ROCK_MASS: f64 = 1.0;
const ROCK_MOMENT_OF_INERTIA: f64 = 1.0;
const ROCK_RADIUS: (f64, f64) = (0.3, 1.0);
const ROCK_SPEED: (f64, f64) = (2.0, 5.0);
const ROCK_ANGULAR_SPEED: f64 = 1.0;
/// Bounds of the largest angle between neighboring rock vertices, in degrees.
const ROCK_ANGLE_STEP: (f64, f64) = (20.0, 50.0);
/// Distance from the chassis center at which pellets are fired.
const SHOT_OFFSET: f64 = 0.3;

pub struct Simulator;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.init_resource::<Status>().add_systems(
            Update,
            (drive, shoot, simulate, replenish_rocks)
                .chain()
                .in_set(SimulationSet),
        );
    }
}

/// Systems advancing the simulation by one frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimulationSet;

#[derive(Resource, Debug, Default)]
pub struct Status {
    pub destroyed: bool,
    pub in_field: bool,
}

/// Keeps a number of rocks in the field. Seeded, so every run sees the same rocks.
#[derive(Resource)]
pub struct RockSpawner {
    rng: ChaCha8Rng,
    rocks: usize,
}

impl RockSpawner {
    pub fn new(seed: u64, rocks: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            rocks,
        }
    }

    /// Jagged rock on the field's border, flung towards a random point of the field.
    fn spawn(&mut self, environment: &Environment) -> Result<Obstacle, EnvironmentError> {
        let rng = &mut self.rng;
        let (width, height) = (environment.width(), environment.height());

        let max_step = rng
            .random_range(ROCK_ANGLE_STEP.0..ROCK_ANGLE_STEP.1)
            .to_radians();
        let mut points = vec![];
        let mut theta: f64 = 0.0;
        while theta < TAU - 1e-6 {
            theta = (theta + rng.random_range(0.0..max_step)).min(TAU);
            let radius = rng.random_range(ROCK_RADIUS.0..ROCK_RADIUS.1);
            points.push(Vector2::from_polar(radius, Angle::new(theta)));
        }

        let t = rng.random_range(0.0..1.0);
        let position = match rng.random_range(0..4) {
            0 => Vector2::new(t * width, 0.0),
            1 => Vector2::new(t * width, height),
            2 => Vector2::new(0.0, t * height),
            _ => Vector2::new(width, t * height),
        };
        let target = Vector2::new(rng.random_range(0.0..width), rng.random_range(0.0..height));

        let mut rigidbody = Rigidbody::new(
            position,
            Angle::ZERO,
            ROCK_MASS,
            ROCK_MOMENT_OF_INERTIA,
        )?;
        rigidbody.set_velocity(
            (target - position).rescale(rng.random_range(ROCK_SPEED.0..ROCK_SPEED.1)),
        );
        rigidbody
            .set_angular_velocity(rng.random_range(-ROCK_ANGULAR_SPEED..ROCK_ANGULAR_SPEED));

        Ok(Obstacle::new(Shape::polygon(points)?, rigidbody))
    }
}

fn drive(command: Res<DriveCommand>, status: Res<Status>, mut swerve: ResMut<SwerveRes>) {
    if status.destroyed {
        return;
    }
    swerve.drive(
        command.velocity,
        command.angular_velocity,
        command.field_oriented,
    );
}

fn shoot(
    command: Res<DriveCommand>,
    status: Res<Status>,
    swerve: Res<SwerveRes>,
    mut environment: ResMut<EnvironmentRes>,
) {
    if !command.fire || status.destroyed {
        return;
    }
    let rigidbody = swerve.rigidbody();
    let offset = rigidbody.heading_vector().rescale(SHOT_OFFSET);
    match environment.shoot(rigidbody, offset) {
        Ok(()) => debug!("pellet fired from {:?}", rigidbody.position()),
        Err(error) => error!("failed to fire pellet: {error}"),
    }
}

fn simulate(
    time: Res<Time>,
    mut swerve: ResMut<SwerveRes>,
    mut environment: ResMut<EnvironmentRes>,
    mut status: ResMut<Status>,
) {
    let dt = time.delta();

    if !status.destroyed {
        swerve.update(dt);
    }
    environment.update(dt);

    match environment.collide_pellets() {
        Ok(0) => {}
        Ok(destroyed) => info!("pellets destroyed {destroyed} rocks"),
        Err(error) => error!("failed to shatter rocks: {error}"),
    }

    let dropped = environment.retain_in_field();
    if dropped > 0 {
        debug!("{dropped} obstacles left the field");
    }

    let position = swerve.rigidbody().position();
    let in_field = environment.contains(&**swerve);
    if status.in_field && !in_field {
        info!("drivetrain left the field at {position:?}");
    }
    status.in_field = in_field;

    if !status.destroyed && environment.has_collision(&**swerve) {
        warn!("drivetrain hit a rock at {position:?}");
        let velocity = swerve.rigidbody().velocity();
        if let Err(error) = environment.shatter(&**swerve, velocity) {
            error!("failed to shatter drivetrain: {error}");
        }
        status.destroyed = true;
    }
}

fn replenish_rocks(spawner: Option<ResMut<RockSpawner>>, mut environment: ResMut<EnvironmentRes>) {
    let Some(mut spawner) = spawner else {
        return;
    };
    let rocks = environment.obstacles().iter().filter(|o| o.is_solid()).count();
    for _ in rocks..spawner.rocks {
        match spawner.spawn(&environment) {
            Ok(rock) => {
                debug!("rock spawned at {:?}", rock.rigidbody().position());
                environment.add(rock);
            }
            Err(error) => error!("failed to spawn rock: {error}"),
        }
    }
}
