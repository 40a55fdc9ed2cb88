//! Controller steering the drivetrain.
//!
//! Drive commands are derived from held directions, the way a driver holds keys. Without a
//! driver the controller follows a scripted route, a cycle of timed legs each holding a set of
//! directions. Some legs fire a pellet when they start.

use std::{collections::BTreeSet, time::Duration};

use bevy::prelude::*;
use once_cell::sync::Lazy;

use crate::{domain::Vector2, simulator::SimulationSet};

/// Top speed of the autopilot in m/s.
const ROUTE_SPEED: f64 = 0.5;
/// Top turn rate of the autopilot in rad/s.
const ROUTE_ANGULAR_SPEED: f64 = 1.0;

static ROUTE: Lazy<Vec<Leg>> = Lazy::new(|| {
    use Direction::*;
    vec![
        Leg::new(1.5, &[Up]),
        Leg::firing(1.5, &[Right]),
        Leg::new(1.5, &[Down]),
        Leg::new(1.5, &[Left]),
        Leg::new(2.0, &[TurnLeft]),
        Leg::new(1.5, &[Up, Right]),
        Leg::new(1.5, &[Down, Left, TurnRight]),
        Leg::firing(1.0, &[]),
    ]
});
static ROUTE_DURATION: Lazy<Duration> = Lazy::new(|| ROUTE.iter().map(|leg| leg.duration).sum());

pub struct Controller;

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        app.init_resource::<DriveCommand>()
            .add_systems(Update, follow_route.before(SimulationSet));
    }
}

/// Command passed to `Swerve::drive` once per tick.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct DriveCommand {
    pub velocity: Vector2,
    pub angular_velocity: f64,
    pub field_oriented: bool,
    /// Fire a pellet from the front of the drivetrain this tick.
    pub fire: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Counter-clockwise.
    TurnLeft,
    /// Clockwise.
    TurnRight,
}

impl Direction {
    fn translation(self) -> Vector2 {
        match self {
            Direction::Up => Vector2::new(0.0, 1.0),
            Direction::Down => Vector2::new(0.0, -1.0),
            Direction::Left => Vector2::new(-1.0, 0.0),
            Direction::Right => Vector2::new(1.0, 0.0),
            Direction::TurnLeft | Direction::TurnRight => Vector2::ZERO,
        }
    }

    fn rotation(self) -> f64 {
        match self {
            Direction::TurnLeft => 1.0,
            Direction::TurnRight => -1.0,
            _ => 0.0,
        }
    }
}

/// Set of held directions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DriveInput {
    held: BTreeSet<Direction>,
}

impl DriveInput {
    pub fn press(&mut self, direction: Direction) {
        self.held.insert(direction);
    }

    pub fn release(&mut self, direction: Direction) {
        self.held.remove(&direction);
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    /// Held translations are summed and the sum is scaled to `max_speed`, so diagonals are
    /// not faster than straight lines and opposite directions cancel out.
    pub fn command(
        &self,
        max_speed: f64,
        max_angular_speed: f64,
        field_oriented: bool,
    ) -> DriveCommand {
        let mut velocity = Vector2::ZERO;
        let mut angular_velocity = 0.0;
        for direction in &self.held {
            velocity += direction.translation();
            angular_velocity += direction.rotation() * max_angular_speed;
        }
        DriveCommand {
            velocity: velocity.rescale(max_speed),
            angular_velocity,
            field_oriented,
            fire: false,
        }
    }
}

impl FromIterator<Direction> for DriveInput {
    fn from_iter<T: IntoIterator<Item = Direction>>(iter: T) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

struct Leg {
    duration: Duration,
    directions: &'static [Direction],
    fire: bool,
}

impl Leg {
    fn new(seconds: f64, directions: &'static [Direction]) -> Self {
        Self {
            duration: Duration::from_secs_f64(seconds),
            directions,
            fire: false,
        }
    }

    /// Leg firing one pellet on its first tick.
    fn firing(seconds: f64, directions: &'static [Direction]) -> Self {
        Self {
            fire: true,
            ..Self::new(seconds, directions)
        }
    }
}

/// Index of the route leg active after `elapsed`. The route repeats.
fn route_leg(elapsed: Duration) -> usize {
    let mut t = elapsed.as_secs_f64() % ROUTE_DURATION.as_secs_f64();
    for (i, leg) in ROUTE.iter().enumerate() {
        if t < leg.duration.as_secs_f64() {
            return i;
        }
        t -= leg.duration.as_secs_f64();
    }
    ROUTE.len() - 1
}

fn follow_route(time: Res<Time>, mut command: ResMut<DriveCommand>, mut leg: Local<Option<usize>>) {
    let current = route_leg(time.elapsed());
    let directions = ROUTE[current].directions;
    let entered = *leg != Some(current);

    if entered {
        info!("autopilot leg {current}: {directions:?}");
        *leg = Some(current);
    }

    *command = DriveCommand {
        fire: entered && ROUTE[current].fire,
        ..directions
            .iter()
            .copied()
            .collect::<DriveInput>()
            .command(ROUTE_SPEED, ROUTE_ANGULAR_SPEED, true)
    };
}
