//! Swerve drivetrain: four independently steered and driven modules on one rigid chassis.

use std::{slice::Iter, time::Duration};

use nalgebra::{SMatrix, SVector, Vector3};
use thiserror::Error;

use super::{
    pid::PidError, Angle, HasCollision, ModuleConfig, Rigidbody, RigidbodyError, Shape,
    ShapeError, SwerveModule, Vector2,
};

/// Maps `(vx, vy, ω)` of the chassis to the stacked `(vx, vy)` of all modules.
type InverseKinematics = SMatrix<f64, 8, 3>;
/// Least-squares inverse of [`InverseKinematics`].
type ForwardKinematics = SMatrix<f64, 3, 8>;

const PSEUDO_INVERSE_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct Swerve {
    modules: [SwerveModule; 4],
    offsets: [Vector2; 4],
    center_of_rotation: Vector2,
    rigidbody: Rigidbody,
    /// Chassis outline at heading zero.
    shape: Shape,
    inverse_kinematics: InverseKinematics,
    forward_kinematics: ForwardKinematics,
    config: SwerveConfig,
}

impl Swerve {
    pub fn new(position: Vector2, heading: Angle, config: SwerveConfig) -> Result<Self, SwerveError> {
        config.validate()?;

        let modules = [
            SwerveModule::new(config.module.clone())?,
            SwerveModule::new(config.module.clone())?,
            SwerveModule::new(config.module.clone())?,
            SwerveModule::new(config.module.clone())?,
        ];
        let offsets = ModuleId::ALL.map(|id| config.module_offset(id));
        let rigidbody = Rigidbody::new(position, heading, config.mass, config.moment_of_inertia)?;
        let shape = Shape::rectangle(config.wheelbase, config.track)?;
        let center_of_rotation = Vector2::ZERO;
        let (inverse_kinematics, forward_kinematics) = kinematics(&offsets, center_of_rotation)?;

        Ok(Self {
            modules,
            offsets,
            center_of_rotation,
            rigidbody,
            shape,
            inverse_kinematics,
            forward_kinematics,
            config,
        })
    }

    pub fn rigidbody(&self) -> &Rigidbody {
        &self.rigidbody
    }

    pub fn module(&self, id: ModuleId) -> &SwerveModule {
        &self.modules[id as usize]
    }

    /// Mounting position of a module relative to the chassis center.
    pub fn module_offset(&self, id: ModuleId) -> Vector2 {
        self.offsets[id as usize]
    }

    pub fn center_of_rotation(&self) -> Vector2 {
        self.center_of_rotation
    }

    pub fn config(&self) -> &SwerveConfig {
        &self.config
    }

    /// Sets the pivot, relative to the chassis center, used to distribute angular velocity
    /// commands.
    pub fn set_center_of_rotation(&mut self, center_of_rotation: Vector2) -> Result<(), SwerveError> {
        let (inverse_kinematics, forward_kinematics) =
            kinematics(&self.offsets, center_of_rotation)?;
        self.center_of_rotation = center_of_rotation;
        self.inverse_kinematics = inverse_kinematics;
        self.forward_kinematics = forward_kinematics;
        Ok(())
    }

    /// Commands a chassis velocity and angular velocity. Without field orientation the
    /// velocity is relative to the chassis, with the front along the positive x-axis.
    ///
    /// If any module would exceed the maximum module speed, all module velocities are scaled
    /// down by the same factor so the motion keeps its shape.
    pub fn drive(&mut self, velocity: Vector2, angular_velocity: f64, field_oriented: bool) {
        let velocity = if field_oriented {
            velocity.rotate(-self.rigidbody.heading())
        } else {
            velocity
        };

        let mut targets = self.module_velocities(velocity, angular_velocity);

        let max_speed = targets
            .iter()
            .map(Vector2::magnitude)
            .fold(0.0, f64::max);
        if max_speed > self.config.max_module_speed {
            let factor = self.config.max_module_speed / max_speed;
            for target in targets.iter_mut() {
                *target = *target * factor;
            }
        }

        for (module, target) in self.modules.iter_mut().zip(targets) {
            module.drive(target);
        }
    }

    pub fn update(&mut self, dt: Duration) {
        for (module, offset) in self.modules.iter_mut().zip(self.offsets) {
            module.update(dt);
            module.apply_physics(&mut self.rigidbody, offset, dt);
        }
        if let Some(friction) = self.config.friction {
            self.rigidbody.apply_friction(friction, dt);
        }
        self.rigidbody.update(dt);
    }

    /// Chassis velocity that best explains the current module velocities, relative to the
    /// chassis.
    pub fn chassis_velocity(&self) -> ChassisVelocity {
        self.forward(self.modules.each_ref().map(SwerveModule::velocity))
    }

    /// Clears the controller state of all modules.
    pub fn reset(&mut self) {
        for module in self.modules.iter_mut() {
            module.reset();
        }
    }

    fn module_velocities(&self, velocity: Vector2, angular_velocity: f64) -> [Vector2; 4] {
        let v = self.inverse_kinematics * Vector3::new(velocity.x(), velocity.y(), angular_velocity);
        std::array::from_fn(|i| Vector2::new(v[2 * i], v[2 * i + 1]))
    }

    fn forward(&self, velocities: [Vector2; 4]) -> ChassisVelocity {
        let v = SVector::<f64, 8>::from_fn(|row, _| {
            let velocity = velocities[row / 2];
            if row % 2 == 0 {
                velocity.x()
            } else {
                velocity.y()
            }
        });
        let q = self.forward_kinematics * v;
        ChassisVelocity {
            velocity: Vector2::new(q[0], q[1]),
            angular_velocity: q[2],
        }
    }
}

impl HasCollision for Swerve {
    fn shape(&self) -> Shape {
        self.shape.rotated(self.rigidbody.heading())
    }

    fn position(&self) -> Vector2 {
        self.rigidbody.position()
    }
}

/// Each module moves with the chassis velocity plus the rotation around the center of
/// rotation: `v + perpendicular(offset - center) * ω`.
fn kinematics(
    offsets: &[Vector2; 4],
    center_of_rotation: Vector2,
) -> Result<(InverseKinematics, ForwardKinematics), SwerveError> {
    let inverse = InverseKinematics::from_fn(|row, col| {
        let lever = (offsets[row / 2] - center_of_rotation).perpendicular();
        match (row % 2, col) {
            (0, 0) | (1, 1) => 1.0,
            (0, 2) => lever.x(),
            (1, 2) => lever.y(),
            _ => 0.0,
        }
    });
    let forward = inverse
        .pseudo_inverse(PSEUDO_INVERSE_EPSILON)
        .map_err(SwerveError::Kinematics)?;
    Ok((inverse, forward))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct ChassisVelocity {
    pub velocity: Vector2,
    pub angular_velocity: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum SwerveError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid module id {0}")]
    InvalidModuleID(usize),
    #[error("kinematics: {0}")]
    Kinematics(&'static str),
    #[error(transparent)]
    Rigidbody(#[from] RigidbodyError),
    #[error(transparent)]
    Pid(#[from] PidError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// All distances are in meters, measured from the chassis center. The chassis front faces
/// the positive x-axis, its left side the positive y-axis.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct SwerveConfig {
    /// Distance between left and right modules.
    pub track: f64,
    /// Distance between front and rear modules.
    pub wheelbase: f64,
    pub mass: f64,
    pub moment_of_inertia: f64,
    pub max_module_speed: f64,
    pub max_angular_speed: f64,
    /// Damping of the chassis, applied once per tick.
    pub friction: Option<f64>,
    pub module: ModuleConfig,
}

impl SwerveConfig {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        track: f64,
        wheelbase: f64,
        mass: f64,
        moment_of_inertia: f64,
        max_module_speed: f64,
        max_angular_speed: f64,
        friction: Option<f64>,
        module: ModuleConfig,
    ) -> Self {
        SwerveConfig {
            track,
            wheelbase,
            mass,
            moment_of_inertia,
            max_module_speed,
            max_angular_speed,
            friction,
            module,
        }
    }

    pub fn module_offset(&self, id: ModuleId) -> Vector2 {
        Vector2::new(
            match id {
                ModuleId::FrontLeft | ModuleId::FrontRight => self.wheelbase / 2.0,
                ModuleId::RearLeft | ModuleId::RearRight => -self.wheelbase / 2.0,
            },
            match id {
                ModuleId::FrontLeft | ModuleId::RearLeft => self.track / 2.0,
                ModuleId::FrontRight | ModuleId::RearRight => -self.track / 2.0,
            },
        )
    }

    pub fn validate(&self) -> Result<(), SwerveError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        let module = &self.module;

        if !positive(self.track) || !positive(self.wheelbase) {
            return Err(SwerveError::InvalidConfig("track and wheelbase must be positive"));
        }
        if !positive(self.max_module_speed) || !positive(self.max_angular_speed) {
            return Err(SwerveError::InvalidConfig("maximum speeds must be positive"));
        }
        if self.friction.is_some_and(|f| !(f.is_finite() && f >= 0.0))
            || module.friction.is_some_and(|f| !(f.is_finite() && f >= 0.0))
        {
            return Err(SwerveError::InvalidConfig("friction must be non-negative"));
        }
        if !positive(module.wheel_diameter) {
            return Err(SwerveError::InvalidConfig("wheel diameter must be positive"));
        }
        if !module.steering_gear_ratio.is_finite() || !module.driving_gear_ratio.is_finite() {
            return Err(SwerveError::InvalidConfig("gear ratios must be finite"));
        }
        if !module.steering_gains.is_finite() || !module.driving_gains.is_finite() {
            return Err(SwerveError::InvalidConfig("PID gains must be finite"));
        }
        Ok(())
    }
}

/// The default module gains keep the steering loop stable for time steps below about 80 ms.
/// Each tick the loop corrects `kp * steering_gear_ratio * dt` of the heading error, about
/// `23.3 * dt`, and overshoots without bound once that exceeds 2.
impl Default for SwerveConfig {
    fn default() -> Self {
        SwerveConfig::new(
            0.7,
            0.7,
            2.0,
            0.5,
            20.0,
            1000f64.to_radians(),
            Some(0.8),
            ModuleConfig::default(),
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum ModuleId {
    FrontLeft,
    RearLeft,
    RearRight,
    FrontRight,
}

impl ModuleId {
    pub const ALL: [ModuleId; 4] = [
        ModuleId::FrontLeft,
        ModuleId::RearLeft,
        ModuleId::RearRight,
        ModuleId::FrontRight,
    ];

    pub fn iter() -> Iter<'static, ModuleId> {
        static MODULES: [ModuleId; 4] = ModuleId::ALL;
        MODULES.iter()
    }
}

impl TryFrom<usize> for ModuleId {
    type Error = SwerveError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        ModuleId::ALL
            .get(value)
            .copied()
            .ok_or(SwerveError::InvalidModuleID(value))
    }
}
