//! Proportional-integral-derivative feedback controller.
//!
//! The controller is stateful: every call to [`PidController::calculate`] advances the integral
//! and derivative terms. Error is accumulated per call rather than per second, so gains are
//! tuned for the caller's tick rate.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct PidController {
    gains: PidGains,
    total_error: f64,
    previous_error: f64,
    continuous_range: Option<(f64, f64)>,
    integrator_limit: Option<f64>,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            total_error: 0.0,
            previous_error: 0.0,
            continuous_range: None,
            integrator_limit: None,
        }
    }

    /// Treats `[min, max)` as a circle, so that the error is always the shortest signed
    /// distance between measurement and reference.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) -> Result<(), PidError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(PidError::InvalidContinuousRange(min, max));
        }
        self.continuous_range = Some((min, max));
        Ok(())
    }

    pub fn disable_continuous_input(&mut self) {
        self.continuous_range = None;
    }

    /// Clamps the accumulated error to `[-limit, limit]`. Without a limit the integral grows
    /// unbounded.
    pub fn with_integrator_limit(self, limit: f64) -> Result<Self, PidError> {
        if !(limit.is_finite() && limit >= 0.0) {
            return Err(PidError::InvalidIntegratorLimit(limit));
        }
        Ok(Self {
            integrator_limit: Some(limit),
            ..self
        })
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous_range.is_some()
    }

    pub fn total_error(&self) -> f64 {
        self.total_error
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Clears the integral and derivative state. Gains and the continuous range are kept.
    pub fn reset(&mut self) {
        self.total_error = 0.0;
        self.previous_error = 0.0;
    }

    pub fn calculate(&mut self, measurement: f64, reference: f64) -> f64 {
        let error = self.error(measurement, reference);

        self.total_error += error;
        if let Some(limit) = self.integrator_limit {
            self.total_error = self.total_error.clamp(-limit, limit);
        }

        let PidGains { kp, ki, kd } = self.gains;
        let output = kp * error + ki * self.total_error + kd * (error - self.previous_error);
        self.previous_error = error;
        output
    }

    fn error(&self, measurement: f64, reference: f64) -> f64 {
        let error = reference - measurement;
        match self.continuous_range {
            Some((min, max)) if error.abs() > (max - min) / 2.0 => {
                if error > 0.0 {
                    error - (max - min)
                } else {
                    error + (max - min)
                }
            }
            _ => error,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum PidError {
    #[error("invalid continuous input range [{0}, {1})")]
    InvalidContinuousRange(f64, f64),
    #[error("invalid integrator limit {0}")]
    InvalidIntegratorLimit(f64),
}
