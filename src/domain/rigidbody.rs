//! Point mass with a point moment of inertia.
//!
//! The integration is deliberately crude: forces are applied as velocity changes scaled by the
//! tick duration (semi-implicit Euler) and friction is a damping term proportional to velocity.
//! Collisions are not resolved here.

use std::time::Duration;

use thiserror::Error;

use super::{Angle, Vector2};

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Rigidbody {
    position: Vector2,
    heading: Angle,
    velocity: Vector2,
    angular_velocity: f64,
    mass: f64,
    moment_of_inertia: f64,
}

impl Rigidbody {
    pub fn new(
        position: Vector2,
        heading: Angle,
        mass: f64,
        moment_of_inertia: f64,
    ) -> Result<Self, RigidbodyError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(RigidbodyError::InvalidMass(mass));
        }
        if !(moment_of_inertia.is_finite() && moment_of_inertia > 0.0) {
            return Err(RigidbodyError::InvalidMomentOfInertia(moment_of_inertia));
        }
        Ok(Self {
            position,
            heading,
            velocity: Vector2::ZERO,
            angular_velocity: 0.0,
            mass,
            moment_of_inertia,
        })
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn heading(&self) -> Angle {
        self.heading
    }

    /// Unit vector pointing to the front.
    pub fn heading_vector(&self) -> Vector2 {
        Vector2::unit(self.heading)
    }

    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia
    }

    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    pub fn set_heading(&mut self, heading: Angle) {
        self.heading = heading;
    }

    pub fn set_velocity(&mut self, velocity: Vector2) {
        self.velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.angular_velocity = angular_velocity;
    }

    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();
        self.position = self.position + self.velocity * dt;
        self.heading = Angle::new(self.heading.radians() + self.angular_velocity * dt);
    }

    /// Applies a world-space force and a torque over `dt`.
    pub fn apply_impulse(&mut self, force: Vector2, torque: f64, dt: Duration) {
        let dt = dt.as_secs_f64();
        self.angular_velocity += torque / self.moment_of_inertia * dt;
        self.velocity = self.velocity + force * (dt / self.mass);
    }

    /// Damps linear and angular velocity by `coefficient * value * dt`.
    pub fn apply_friction(&mut self, coefficient: f64, dt: Duration) {
        let dt = dt.as_secs_f64();
        self.angular_velocity -= coefficient * self.angular_velocity * dt;
        self.velocity = self.velocity - self.velocity * (coefficient * dt);
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RigidbodyError {
    #[error("mass must be positive, got {0}")]
    InvalidMass(f64),
    #[error("moment of inertia must be positive, got {0}")]
    InvalidMomentOfInertia(f64),
}

#[cfg(test)]
mod tests {
    use std::{f64::consts::PI, time::Duration};

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const EPSILON: f64 = 1e-12;

    fn body() -> Rigidbody {
        Rigidbody::new(Vector2::new(1.0, 2.0), Angle::ZERO, 2.0, 0.5).unwrap()
    }

    #[rstest]
    #[case::up(             0.5 * PI, 1.0, 1, ( 0.0,  1.0) )]
    #[case::down(          -0.5 * PI, 1.0, 1, ( 0.0, -1.0) )]
    #[case::left(                 PI, 1.0, 1, (-1.0,  0.0) )]
    #[case::right(               0.0, 1.0, 1, ( 1.0,  0.0) )]
    #[case::double_time(         0.0, 1.0, 2, ( 2.0,  0.0) )]
    #[case::double_velocity(     0.0, 2.0, 1, ( 2.0,  0.0) )]
    fn test_rigidbody_update_position(
        #[case] direction: f64,
        #[case] speed: f64,
        #[case] time: u64,
        #[case] position: (f64, f64),
    ) {
        let mut body = Rigidbody::new(Vector2::ZERO, Angle::ZERO, 1.0, 1.0).unwrap();
        body.set_velocity(Vector2::from_polar(speed, Angle::new(direction)));
        body.update(Duration::from_secs(time));
        assert_abs_diff_eq!(body.position(), Vector2::from(position), epsilon = EPSILON);
        assert_abs_diff_eq!(body.heading(), Angle::ZERO);
    }

    #[rstest]
    fn test_rigidbody_update_without_forces(
        #[values(0, 16, 100, 2500)] millis: u64,
        #[values(-3.0, 0.0, 1.5)] angular_velocity: f64,
    ) {
        let mut body = body();
        let velocity = Vector2::new(0.5, -0.25);
        body.set_velocity(velocity);
        body.set_angular_velocity(angular_velocity);
        let dt = Duration::from_millis(millis);

        body.apply_impulse(Vector2::ZERO, 0.0, dt);
        body.apply_friction(0.0, dt);
        body.update(dt);

        let dt = dt.as_secs_f64();
        assert_eq!(body.velocity(), velocity);
        assert_eq!(body.angular_velocity(), angular_velocity);
        assert_abs_diff_eq!(
            body.position(),
            Vector2::new(1.0, 2.0) + velocity * dt,
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(
            body.heading(),
            Angle::new(angular_velocity * dt),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_rigidbody_heading_wraps() {
        let mut body = body();
        body.set_heading(Angle::new(0.9 * PI));
        body.set_angular_velocity(0.2 * PI);
        body.update(Duration::from_secs(1));
        assert_abs_diff_eq!(body.heading(), Angle::new(-0.9 * PI), epsilon = EPSILON);
    }

    #[test]
    fn test_rigidbody_apply_impulse() {
        let mut body = body();
        body.apply_impulse(Vector2::new(4.0, -2.0), 1.0, Duration::from_millis(500));
        assert_abs_diff_eq!(body.velocity(), Vector2::new(1.0, -0.5), epsilon = EPSILON);
        assert_abs_diff_eq!(body.angular_velocity(), 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(body.position(), Vector2::new(1.0, 2.0));
    }

    #[test]
    fn test_rigidbody_apply_friction() {
        let mut body = body();
        body.set_velocity(Vector2::new(2.0, -4.0));
        body.set_angular_velocity(3.0);
        body.apply_friction(0.5, Duration::from_millis(100));
        assert_abs_diff_eq!(body.velocity(), Vector2::new(1.9, -3.8), epsilon = EPSILON);
        assert_abs_diff_eq!(body.angular_velocity(), 2.85, epsilon = EPSILON);
    }

    #[test]
    fn test_rigidbody_heading_vector() {
        let mut body = body();
        body.set_heading(Angle::new(0.5 * PI));
        assert_abs_diff_eq!(body.heading_vector(), Vector2::new(0.0, 1.0), epsilon = EPSILON);
    }

    #[rstest]
    #[case(0.0, 1.0, RigidbodyError::InvalidMass(0.0))]
    #[case(-1.0, 1.0, RigidbodyError::InvalidMass(-1.0))]
    #[case(1.0, 0.0, RigidbodyError::InvalidMomentOfInertia(0.0))]
    #[case(1.0, f64::INFINITY, RigidbodyError::InvalidMomentOfInertia(f64::INFINITY))]
    fn test_rigidbody_invalid(
        #[case] mass: f64,
        #[case] moment_of_inertia: f64,
        #[case] error: RigidbodyError,
    ) {
        assert_eq!(
            Rigidbody::new(Vector2::ZERO, Angle::ZERO, mass, moment_of_inertia),
            Err(error)
        );
    }
}
