//! A single swerve module: one wheel that is steered and driven independently.
//!
//! All vectors of a module are in chassis space. The module does not know where it is mounted,
//! the drivetrain passes the mounting offset when the module applies its force to the chassis.

use std::{f64::consts::PI, time::Duration};

use super::{
    pid::{PidController, PidError, PidGains},
    Angle, Rigidbody, Vector2, DIRECTION_EPSILON,
};

/// Constants of a module. Gear ratios scale controller output into actuator motion.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct ModuleConfig {
    pub steering_gains: PidGains,
    pub driving_gains: PidGains,
    pub steering_gear_ratio: f64,
    pub driving_gear_ratio: f64,
    pub wheel_diameter: f64,
    /// Damping applied to the chassis after this module's force, if any. Drivetrains damp the
    /// chassis once per tick instead, see `SwerveConfig::friction`.
    pub friction: Option<f64>,
    /// Bound of the accumulated error of both controllers, if any.
    pub integrator_limit: Option<f64>,
}

impl ModuleConfig {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        steering_gains: PidGains,
        driving_gains: PidGains,
        steering_gear_ratio: f64,
        driving_gear_ratio: f64,
        wheel_diameter: f64,
        friction: Option<f64>,
        integrator_limit: Option<f64>,
    ) -> Self {
        ModuleConfig {
            steering_gains,
            driving_gains,
            steering_gear_ratio,
            driving_gear_ratio,
            wheel_diameter,
            friction,
            integrator_limit,
        }
    }

    pub fn wheel_circumference(&self) -> f64 {
        self.wheel_diameter * PI
    }
}

impl Default for ModuleConfig {
    /// MK4i-style module: 150/7 steering reduction, L2 driving reduction, 0.1 m wheels.
    ///
    /// The proportional loops gain `kp * gear_ratio * dt` per tick: about `23.3 * dt` for
    /// steering and `14.8 * dt` for driving. Each diverges above 2, so steps must stay below
    /// about 80 ms.
    fn default() -> Self {
        ModuleConfig::new(
            PidGains::new(500.0, 0.0, 0.0),
            PidGains::new(100.0, 0.0, 0.0),
            1.0 / (150.0 / 7.0),
            1.0 / 6.75,
            0.1,
            None,
            None,
        )
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct SwerveModule {
    steering_pid: PidController,
    driving_pid: PidController,
    velocity: Vector2,
    target_velocity: Vector2,
    heading: Angle,
    speed_rotations: f64,
    config: ModuleConfig,
}

impl SwerveModule {
    pub fn new(config: ModuleConfig) -> Result<Self, PidError> {
        let mut steering_pid = PidController::new(config.steering_gains);
        let mut driving_pid = PidController::new(config.driving_gains);
        if let Some(limit) = config.integrator_limit {
            steering_pid = steering_pid.with_integrator_limit(limit)?;
            driving_pid = driving_pid.with_integrator_limit(limit)?;
        }
        steering_pid.enable_continuous_input(-PI, PI)?;

        Ok(Self {
            steering_pid,
            driving_pid,
            velocity: Vector2::ZERO,
            target_velocity: Vector2::ZERO,
            heading: Angle::ZERO,
            speed_rotations: 0.0,
            config,
        })
    }

    /// Current wheel velocity.
    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    pub fn target_velocity(&self) -> Vector2 {
        self.target_velocity
    }

    /// Wheel azimuth.
    pub fn heading(&self) -> Angle {
        self.heading
    }

    /// Signed wheel speed in revolutions per second.
    pub fn speed_rotations(&self) -> f64 {
        self.speed_rotations
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn drive(&mut self, target_velocity: Vector2) {
        self.target_velocity = target_velocity;
    }

    /// Clears the controllers' integral and derivative state.
    pub fn reset(&mut self) {
        self.steering_pid.reset();
        self.driving_pid.reset();
    }

    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();

        // Only the component along the current wheel direction is driven, so a wheel that
        // still points the wrong way does not push the chassis sideways. The steering target
        // is flipped when the wheel is closer to the opposite direction.
        let heading = Vector2::unit(self.heading);
        let target_speed = self.target_velocity.dot(heading);
        let current_target_velocity = self.target_velocity * target_speed;

        let target_heading = if current_target_velocity.magnitude() < DIRECTION_EPSILON {
            self.target_velocity.angle()
        } else {
            current_target_velocity.angle()
        };
        let steering = self
            .steering_pid
            .calculate(self.heading.radians(), target_heading.radians());
        self.heading =
            Angle::new(self.heading.radians() + self.config.steering_gear_ratio * steering * dt);

        let target_speed_rotations = self.meters_to_rotations(target_speed);
        let driving = self
            .driving_pid
            .calculate(self.speed_rotations, target_speed_rotations);
        self.speed_rotations += self.config.driving_gear_ratio * driving * dt;

        self.velocity = Vector2::from_polar(
            self.rotations_to_meters(self.speed_rotations),
            self.heading,
        );
    }

    /// Pushes the chassis with this module's velocity as force. The force is rotated into
    /// world space, the torque stays relative to the chassis.
    pub fn apply_physics(&self, rigidbody: &mut Rigidbody, offset: Vector2, dt: Duration) {
        let force = self.velocity.rotate(rigidbody.heading());
        let torque = offset.cross(self.velocity);
        rigidbody.apply_impulse(force, torque, dt);
        if let Some(friction) = self.config.friction {
            rigidbody.apply_friction(friction, dt);
        }
    }

    fn meters_to_rotations(&self, meters: f64) -> f64 {
        meters / self.config.wheel_circumference()
    }

    fn rotations_to_meters(&self, rotations: f64) -> f64 {
        rotations * self.config.wheel_circumference()
    }
}
