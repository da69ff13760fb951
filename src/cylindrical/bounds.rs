use crate::cylindrical::binding::VariableBinding;
use crate::cylindrical::error::ValidationError;

/// Three closed intervals of a cylindrical box: r in [r_min, r_max], theta in
/// [theta_min, theta_max] (radians), z in [z_min, z_max].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationBounds {
    pub r_min: f64,
    pub r_max: f64,
    pub theta_min: f64,
    pub theta_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl IntegrationBounds {
    pub fn new(
        r_min: f64,
        r_max: f64,
        theta_min: f64,
        theta_max: f64,
        z_min: f64,
        z_max: f64,
    ) -> Self {
        IntegrationBounds {
            r_min,
            r_max,
            theta_min,
            theta_max,
            z_min,
            z_max,
        }
    }

    /// Every bound finite and every max strictly above its min, checked radial first.
    pub fn validate(&self, binding: &VariableBinding) -> Result<(), ValidationError> {
        check_interval(binding.radial, self.r_min, self.r_max)?;
        check_interval(binding.angular, self.theta_min, self.theta_max)?;
        check_interval(binding.vertical, self.z_min, self.z_max)
    }

    /// volume of the region, (r_max² - r_min²)(θ_max - θ_min)(z_max - z_min)/2
    pub fn region_volume(&self) -> f64 {
        (self.r_max.powi(2) - self.r_min.powi(2))
            * (self.theta_max - self.theta_min)
            * (self.z_max - self.z_min)
            / 2.0
    }

    pub fn theta_degrees(&self) -> (f64, f64) {
        (self.theta_min.to_degrees(), self.theta_max.to_degrees())
    }

    /// Height used for the function surface when none is given: middle of the z range.
    pub fn default_height(&self) -> f64 {
        (self.z_min + self.z_max) / 2.0
    }
}

pub(crate) fn check_interval(variable: &str, min: f64, max: f64) -> Result<(), ValidationError> {
    for value in [min, max] {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteBound {
                variable: variable.to_string(),
                value,
            });
        }
    }
    if max <= min {
        return Err(ValidationError::EmptyInterval {
            variable: variable.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_validate() {
        let binding = VariableBinding::CYLINDRICAL;
        assert!(IntegrationBounds::new(0.0, 1.0, 0.0, PI, 0.0, 2.0).validate(&binding).is_ok());
        assert_eq!(
            IntegrationBounds::new(0.0, 1.0, 1.0, 1.0, 0.0, 2.0).validate(&binding),
            Err(ValidationError::EmptyInterval {
                variable: "theta".to_string(),
                min: 1.0,
                max: 1.0
            })
        );
        assert!(matches!(
            IntegrationBounds::new(0.0, f64::INFINITY, 0.0, 1.0, 0.0, 1.0).validate(&binding),
            Err(ValidationError::NonFiniteBound { .. })
        ));
        // radial is reported first when several intervals are wrong
        let err = IntegrationBounds::new(2.0, 1.0, 1.0, 0.0, 3.0, 0.0)
            .validate(&binding)
            .unwrap_err();
        assert!(err.to_string().starts_with("r:"));
    }

    #[test]
    fn test_region_summary() {
        let bounds = IntegrationBounds::new(0.0, 2.0, 0.0, 2.0 * PI, 0.0, 3.0);
        assert_relative_eq!(bounds.region_volume(), 12.0 * PI, epsilon = 1e-12);
        let (lo, hi) = bounds.theta_degrees();
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 360.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.default_height(), 1.5);
    }
}
