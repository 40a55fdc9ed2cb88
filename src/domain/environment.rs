//! Field with obstacles.
//!
//! The environment is the collidable registry of the simulation. Anything that wants to know
//! what it hits is handed the environment explicitly.

use std::time::Duration;

use thiserror::Error;

use super::{Angle, HasCollision, Rigidbody, RigidbodyError, Shape, ShapeError, Vector2};

const DEBRIS_MASS: f64 = 1.0;
const DEBRIS_MOMENT_OF_INERTIA: f64 = 1.0;
/// Speed at which debris flies away from the center of the shattered object.
const BLAST_SPEED: f64 = 10.0;
const PELLET_MASS: f64 = 1.0;
const PELLET_MOMENT_OF_INERTIA: f64 = 1.0;
const PELLET_SPEED: f64 = 10.0;
const PELLET_LENGTH: f64 = 0.1;

/// Rectangular field spanning `[0, width] x [0, height]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    width: f64,
    height: f64,
    /// Field outline around its center.
    field: Shape,
    obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new(width: f64, height: f64) -> Result<Self, EnvironmentError> {
        Ok(Self {
            width,
            height,
            field: Shape::rectangle(width, height)?,
            obstacles: vec![],
        })
    }

    pub fn with_obstacles(mut self, obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        self.obstacles.extend(obstacles);
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Moves all obstacles along their velocities.
    pub fn update(&mut self, dt: Duration) {
        for obstacle in self.obstacles.iter_mut() {
            obstacle.rigidbody.update(dt);
        }
    }

    pub fn has_collision(&self, object: &dyn HasCollision) -> bool {
        self.colliding(object).next().is_some()
    }

    /// Indices of the solid obstacles colliding with `object`. Debris never collides.
    pub fn colliding<'a>(
        &'a self,
        object: &'a dyn HasCollision,
    ) -> impl Iterator<Item = usize> + 'a {
        self.obstacles
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_solid() && o.has_collision(object))
            .map(|(i, _)| i)
    }

    /// Whether `object` lies completely inside the field.
    pub fn contains(&self, object: &dyn HasCollision) -> bool {
        let bounds = object.shape().bounds();
        let min = object.position() + bounds.min;
        let max = object.position() + bounds.max;
        min.x() >= 0.0 && min.y() >= 0.0 && max.x() <= self.width && max.y() <= self.height
    }

    /// Whether `object` still touches the field.
    pub fn in_field(&self, object: &dyn HasCollision) -> bool {
        self.field
            .overlaps(&object.shape(), object.position() - self.center())
    }

    /// Drops obstacles that left the field and returns how many were dropped.
    pub fn retain_in_field(&mut self) -> usize {
        let n = self.obstacles.len();
        let obstacles = std::mem::take(&mut self.obstacles);
        self.obstacles = obstacles.into_iter().filter(|o| self.in_field(o)).collect();
        n - self.obstacles.len()
    }

    /// Breaks the outline of `object` into debris segments. Returns the number of segments
    /// added.
    pub fn shatter(
        &mut self,
        object: &dyn HasCollision,
        velocity: Vector2,
    ) -> Result<usize, EnvironmentError> {
        let debris = blast(object, velocity)?;
        let n = debris.len();
        self.obstacles.extend(debris);
        Ok(n)
    }

    /// Fires a pellet from `offset` relative to the shooter, flying away from it.
    pub fn shoot(&mut self, shooter: &Rigidbody, offset: Vector2) -> Result<(), EnvironmentError> {
        let velocity = offset.rescale(PELLET_SPEED);
        let mut rigidbody = Rigidbody::new(
            shooter.position() + offset,
            Angle::ZERO,
            PELLET_MASS,
            PELLET_MOMENT_OF_INERTIA,
        )?;
        rigidbody.set_velocity(velocity);
        self.obstacles.push(Obstacle {
            shape: Shape::line(Vector2::ZERO, velocity.rescale(PELLET_LENGTH)),
            rigidbody,
            kind: ObstacleKind::Pellet,
        });
        Ok(())
    }

    /// Shatters every rock hit by a pellet and drops the pellet. Each pellet destroys at most
    /// one rock. Returns the number of rocks destroyed.
    pub fn collide_pellets(&mut self) -> Result<usize, EnvironmentError> {
        let mut hits: Vec<(usize, usize)> = vec![];
        for (p, pellet) in self.obstacles.iter().enumerate() {
            if pellet.kind != ObstacleKind::Pellet {
                continue;
            }
            let rock = self.obstacles.iter().enumerate().rev().find(|(r, rock)| {
                rock.is_solid()
                    && !hits.iter().any(|(_, hit)| hit == r)
                    && rock.has_collision(pellet)
            });
            if let Some((r, _)) = rock {
                hits.push((p, r));
            }
        }

        let mut debris = vec![];
        for (_, r) in hits.iter() {
            let rock = &self.obstacles[*r];
            debris.extend(blast(rock, rock.rigidbody.velocity())?);
        }
        let mut i = 0;
        self.obstacles.retain(|_| {
            let hit = hits.iter().any(|(p, r)| *p == i || *r == i);
            i += 1;
            !hit
        });
        self.obstacles.extend(debris);
        Ok(hits.len())
    }
}

/// One debris line per outline segment of `object`. Each line is centered on its own
/// midpoint and flies away from the object's center on top of `velocity`.
fn blast(object: &dyn HasCollision, velocity: Vector2) -> Result<Vec<Obstacle>, EnvironmentError> {
    let shape = object.shape();
    shape
        .edges()
        .segments()
        .map(|segment| -> Result<Obstacle, EnvironmentError> {
            let middle = (segment.start() + segment.end()) / 2.0;
            let mut rigidbody = Rigidbody::new(
                object.position() + middle,
                Angle::ZERO,
                DEBRIS_MASS,
                DEBRIS_MOMENT_OF_INERTIA,
            )?;
            rigidbody.set_velocity(velocity + middle.rescale(BLAST_SPEED));
            Ok(Obstacle::debris(
                Shape::line(segment.start() - middle, segment.end() - middle),
                rigidbody,
            ))
        })
        .collect()
}

/// Shape carried by a rigidbody. The shape turns with the rigidbody's heading.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    shape: Shape,
    rigidbody: Rigidbody,
    kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(shape: Shape, rigidbody: Rigidbody) -> Self {
        Self {
            shape,
            rigidbody,
            kind: ObstacleKind::default(),
        }
    }

    pub fn debris(shape: Shape, rigidbody: Rigidbody) -> Self {
        Self {
            shape,
            rigidbody,
            kind: ObstacleKind::Debris,
        }
    }

    pub fn rigidbody(&self) -> &Rigidbody {
        &self.rigidbody
    }

    pub fn rigidbody_mut(&mut self) -> &mut Rigidbody {
        &mut self.rigidbody
    }

    pub fn kind(&self) -> ObstacleKind {
        self.kind
    }

    pub fn is_solid(&self) -> bool {
        self.kind == ObstacleKind::Rock
    }
}

impl HasCollision for Obstacle {
    fn shape(&self) -> Shape {
        self.shape.rotated(self.rigidbody.heading())
    }

    fn position(&self) -> Vector2 {
        self.rigidbody.position()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub enum ObstacleKind {
    #[default]
    Rock,
    Debris,
    /// Shot that shatters the first rock it hits.
    Pellet,
}

#[derive(Error, Debug, PartialEq)]
pub enum EnvironmentError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Rigidbody(#[from] RigidbodyError),
}

#[cfg(test)]
mod tests {
    use std::{f64::consts::PI, time::Duration};

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::super::{Swerve, SwerveConfig};
    use super::*;

    fn rock(x: f64, y: f64, width: f64, height: f64) -> Obstacle {
        Obstacle::new(
            Shape::rectangle(width, height).unwrap(),
            Rigidbody::new(Vector2::new(x, y), Angle::ZERO, 1.0, 1.0).unwrap(),
        )
    }

    fn swerve(x: f64, y: f64, heading: f64) -> Swerve {
        Swerve::new(Vector2::new(x, y), Angle::new(heading), SwerveConfig::default()).unwrap()
    }

    fn environment() -> Environment {
        Environment::new(10.0, 10.0)
            .unwrap()
            .with_obstacles([rock(5.0, 5.0, 1.0, 1.0)])
    }

    #[rstest]
    #[case::edges_cross(swerve(5.8, 5.0, 0.0), true)]
    #[case::inside(swerve(5.0, 5.0, 0.0), true)]
    #[case::corner_first(swerve(5.0, 5.95, 0.25 * PI), true)]
    #[case::above(swerve(5.0, 5.95, 0.0), false)]
    #[case::apart(swerve(7.0, 5.0, 0.0), false)]
    fn test_environment_has_collision(#[case] swerve: Swerve, #[case] collision: bool) {
        assert_eq!(environment().has_collision(&swerve), collision);
    }

    #[test]
    fn test_environment_colliding() {
        let mut environment = environment();
        environment.add(rock(8.0, 5.0, 1.0, 1.0));
        environment.add(rock(6.6, 5.0, 1.0, 1.0));
        let swerve = swerve(5.8, 5.0, 0.0);
        assert_eq!(environment.colliding(&swerve).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[rstest]
    #[case::center(swerve(5.0, 5.0, 0.0), true)]
    #[case::near_edge(swerve(0.36, 5.0, 0.0), true)]
    #[case::crossing_edge(swerve(0.2, 5.0, 0.0), false)]
    #[case::rotated_corner(swerve(0.4, 5.0, 0.25 * PI), false)]
    #[case::outside(swerve(11.0, 5.0, 0.0), false)]
    fn test_environment_contains(#[case] swerve: Swerve, #[case] contains: bool) {
        assert_eq!(environment().contains(&swerve), contains);
    }

    #[rstest]
    #[case::inside(rock(5.0, 5.0, 1.0, 1.0), true)]
    #[case::crossing_edge(rock(9.8, 5.0, 1.0, 1.0), true)]
    #[case::enclosing_field(rock(5.0, 5.0, 20.0, 20.0), true)]
    #[case::outside(rock(11.0, 5.0, 1.0, 1.0), false)]
    fn test_environment_in_field(#[case] obstacle: Obstacle, #[case] in_field: bool) {
        assert_eq!(environment().in_field(&obstacle), in_field);
    }

    #[test]
    fn test_environment_retain_in_field() {
        let mut environment = environment().with_obstacles([
            rock(9.8, 5.0, 1.0, 1.0),
            rock(11.0, 5.0, 1.0, 1.0),
            rock(5.0, -2.0, 1.0, 1.0),
        ]);
        assert_eq!(environment.retain_in_field(), 2);
        assert_eq!(environment.obstacles().len(), 2);
        assert_eq!(environment.retain_in_field(), 0);
    }

    #[test]
    fn test_environment_update_moves_obstacles() {
        let mut environment = environment();
        let rigidbody = environment.obstacles[0].rigidbody_mut();
        rigidbody.set_velocity(Vector2::new(1.0, -0.5));
        rigidbody.set_angular_velocity(0.5 * PI);

        environment.update(Duration::from_secs(1));

        let obstacle = &environment.obstacles()[0];
        assert_abs_diff_eq!(obstacle.position(), Vector2::new(6.0, 4.5), epsilon = 1e-12);
        assert_abs_diff_eq!(obstacle.rigidbody().heading(), Angle::new(0.5 * PI));
    }

    #[test]
    fn test_obstacle_shape_follows_heading() {
        let mut obstacle = rock(0.0, 0.0, 2.0, 1.0);
        assert!(obstacle.shape().hit(Vector2::new(0.9, 0.0)));
        assert!(!obstacle.shape().hit(Vector2::new(0.0, 0.9)));

        obstacle.rigidbody_mut().set_heading(Angle::new(0.5 * PI));
        assert!(!obstacle.shape().hit(Vector2::new(0.9, 0.0)));
        assert!(obstacle.shape().hit(Vector2::new(0.0, 0.9)));
    }

    #[test]
    fn test_environment_shatter() {
        let mut environment = Environment::new(10.0, 10.0).unwrap();
        let swerve = swerve(5.0, 5.0, 0.0);

        let n = environment.shatter(&swerve, Vector2::new(1.0, 0.0)).unwrap();

        assert_eq!(n, 4);
        assert!(!environment.has_collision(&swerve));
        for obstacle in environment.obstacles() {
            assert_eq!(obstacle.kind(), ObstacleKind::Debris);
            let Shape::Line { start, end } = obstacle.shape() else {
                panic!("debris is not a line: {obstacle:?}");
            };
            assert_abs_diff_eq!(start + end, Vector2::ZERO, epsilon = 1e-12);
            assert_abs_diff_eq!(
                obstacle.position().distance(swerve.position()),
                0.35,
                epsilon = 1e-12
            );
        }

        environment.update(Duration::from_millis(100));
        let drifted = swerve.position() + Vector2::new(0.1, 0.0);
        let positions: Vec<Vector2> =
            environment.obstacles().iter().map(|o| o.position()).collect();
        for (i, position) in positions.iter().enumerate() {
            assert_abs_diff_eq!(position.distance(drifted), 1.35, epsilon = 1e-9);
            for other in &positions[i + 1..] {
                assert!(position.distance(*other) > 1.0, "{position:?} {other:?}");
            }
        }
        assert_eq!(environment.retain_in_field(), 0);
    }

    fn shooter() -> Rigidbody {
        Rigidbody::new(Vector2::new(5.0, 5.0), Angle::ZERO, 1.0, 1.0).unwrap()
    }

    fn count(environment: &Environment, kind: ObstacleKind) -> usize {
        environment.obstacles().iter().filter(|o| o.kind() == kind).count()
    }

    #[test]
    fn test_environment_shoot() {
        let mut environment = Environment::new(10.0, 10.0).unwrap();
        environment.shoot(&shooter(), Vector2::new(0.0, 0.5)).unwrap();

        let pellet = &environment.obstacles()[0];
        assert_eq!(pellet.kind(), ObstacleKind::Pellet);
        assert!(!pellet.is_solid());
        assert_eq!(pellet.position(), Vector2::new(5.0, 5.5));
        assert_eq!(pellet.rigidbody().velocity(), Vector2::new(0.0, 10.0));
        assert_eq!(pellet.shape(), Shape::line(Vector2::ZERO, Vector2::new(0.0, 0.1)));
    }

    #[test]
    fn test_environment_pellet_shatters_rock() {
        let mut environment = Environment::new(10.0, 10.0)
            .unwrap()
            .with_obstacles([rock(7.0, 5.0, 1.0, 1.0)]);
        environment.shoot(&shooter(), Vector2::new(0.5, 0.0)).unwrap();
        assert_eq!(environment.collide_pellets().unwrap(), 0);

        environment.update(Duration::from_millis(150));

        assert_eq!(environment.collide_pellets().unwrap(), 1);
        assert_eq!(count(&environment, ObstacleKind::Rock), 0);
        assert_eq!(count(&environment, ObstacleKind::Pellet), 0);
        assert_eq!(count(&environment, ObstacleKind::Debris), 4);
        for debris in environment.obstacles() {
            assert_abs_diff_eq!(
                debris.position().distance(Vector2::new(7.0, 5.0)),
                0.5,
                epsilon = 1e-12
            );
            assert_abs_diff_eq!(debris.rigidbody().velocity().magnitude(), 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_environment_pellet_misses_rock() {
        let mut environment = Environment::new(10.0, 10.0)
            .unwrap()
            .with_obstacles([rock(7.0, 5.0, 1.0, 1.0)]);
        environment.shoot(&shooter(), Vector2::new(0.0, 0.5)).unwrap();

        environment.update(Duration::from_millis(150));
        assert_eq!(environment.collide_pellets().unwrap(), 0);
        assert_eq!(count(&environment, ObstacleKind::Rock), 1);
        assert_eq!(count(&environment, ObstacleKind::Pellet), 1);

        environment.update(Duration::from_secs(1));
        assert_eq!(environment.retain_in_field(), 1);
        assert_eq!(count(&environment, ObstacleKind::Pellet), 0);
    }

    #[test]
    fn test_environment_pellet_destroys_one_rock() {
        let mut environment = Environment::new(10.0, 10.0)
            .unwrap()
            .with_obstacles([rock(7.0, 5.0, 1.0, 1.0)]);
        environment.shoot(&shooter(), Vector2::new(0.5, 0.0)).unwrap();
        environment.shoot(&shooter(), Vector2::new(0.5, 0.0)).unwrap();
        environment.update(Duration::from_millis(150));

        assert_eq!(environment.collide_pellets().unwrap(), 1);
        assert_eq!(count(&environment, ObstacleKind::Pellet), 1);
        assert_eq!(count(&environment, ObstacleKind::Debris), 4);
    }

    #[rstest]
    #[case(0.0, 10.0)]
    #[case(10.0, -1.0)]
    #[case(f64::NAN, 10.0)]
    fn test_environment_invalid(#[case] width: f64, #[case] height: f64) {
        assert!(matches!(
            Environment::new(width, height),
            Err(EnvironmentError::Shape(ShapeError::InvalidDimensions(..)))
        ));
    }
}
