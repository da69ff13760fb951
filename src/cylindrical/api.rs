//! The four operations offered to a presentation layer.
//!
//! Every operation validates its bounds before any other work, returns a `Result`, and logs a
//! failure with `log::error!` before handing it back. Nothing here panics on user input.

use crate::Utils::config::EngineConfig;
use crate::cylindrical::binding::VariableBinding;
use crate::cylindrical::bounds::{IntegrationBounds, check_interval};
use crate::cylindrical::error::{CalcError, ValidationError};
use crate::cylindrical::figure::Figure;
use crate::cylindrical::mesh::{MeshResolution, SurfaceResolution, function_figure, region_figure};
use crate::cylindrical::triple_integral::{IntegrationResult, integrate_cylindrical};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::DEFAULT_QUADRATURE_DEGREE;
use log::{error, info, warn};
use ndarray::ArrayD;

/// Settings shared by all operations. Holds no state between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CylindricalCalculator {
    pub binding: VariableBinding,
    pub mesh: MeshResolution,
    pub surface: SurfaceResolution,
    pub quadrature_degree: usize,
}

impl Default for CylindricalCalculator {
    fn default() -> Self {
        CylindricalCalculator {
            binding: VariableBinding::CYLINDRICAL,
            mesh: MeshResolution::default(),
            surface: SurfaceResolution::default(),
            quadrature_degree: DEFAULT_QUADRATURE_DEGREE,
        }
    }
}

fn logged<T>(operation: &str, result: Result<T, CalcError>) -> Result<T, CalcError> {
    if let Err(e) = &result {
        error!("{}: {}", operation, e);
    }
    result
}

impl CylindricalCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        CylindricalCalculator {
            binding: VariableBinding::CYLINDRICAL,
            mesh: config.mesh,
            surface: config.surface,
            quadrature_degree: config.quadrature_degree,
        }
    }

    /// Parses function text over the bound variable names.
    pub fn parse(&self, expression_text: &str) -> Result<Expr, CalcError> {
        Ok(Expr::parse_expression(
            expression_text,
            &self.binding.names(),
        )?)
    }

    /// Point-wise values of the function over broadcastable r, θ, z arrays.
    pub fn evaluate(
        &self,
        expression_text: &str,
        r: &ArrayD<f64>,
        theta: &ArrayD<f64>,
        z: &ArrayD<f64>,
    ) -> Result<ArrayD<f64>, CalcError> {
        let result = self.parse(expression_text).and_then(|expr| {
            Ok(expr.eval_vectorized_with_degree(
                &self.binding.names(),
                &[r.clone(), theta.clone(), z.clone()],
                self.quadrature_degree,
            )?)
        });
        logged("evaluate", result)
    }

    /// ∭ f r dz dθ dr over the box, z first, then θ, then r.
    #[allow(clippy::too_many_arguments)]
    pub fn integrate_triple(
        &self,
        expression_text: &str,
        r_min: f64,
        r_max: f64,
        theta_min: f64,
        theta_max: f64,
        z_min: f64,
        z_max: f64,
    ) -> Result<IntegrationResult, CalcError> {
        let bounds = IntegrationBounds::new(r_min, r_max, theta_min, theta_max, z_min, z_max);
        self.integrate_bounds(expression_text, &bounds)
    }

    /// Same as `integrate_triple` with the bounds packed in one value.
    pub fn integrate_bounds(
        &self,
        expression_text: &str,
        bounds: &IntegrationBounds,
    ) -> Result<IntegrationResult, CalcError> {
        let result = bounds
            .validate(&self.binding)
            .map_err(CalcError::from)
            .and_then(|_| self.parse(expression_text))
            .and_then(|expr| {
                info!("integrating {} over {:?}", expr, bounds);
                integrate_cylindrical(
                    &expr,
                    expression_text,
                    bounds,
                    &self.binding,
                    self.quadrature_degree,
                )
            });
        logged("integrate_triple", result)
    }

    /// Boundary surfaces of the box. Bounds are not required to be valid here; a reversed
    /// interval only flips the sampling direction.
    pub fn build_region_figure(
        &self,
        r_min: f64,
        r_max: f64,
        theta_min: f64,
        theta_max: f64,
        z_min: f64,
        z_max: f64,
    ) -> Figure {
        let bounds = IntegrationBounds::new(r_min, r_max, theta_min, theta_max, z_min, z_max);
        if let Err(e) = bounds.validate(&self.binding) {
            warn!("region figure for invalid bounds: {}", e);
        }
        region_figure(&bounds, &self.mesh)
    }

    /// Surface of the function over (r, θ) at height `z_fixed`.
    pub fn build_function_figure(
        &self,
        expression_text: &str,
        r_min: f64,
        r_max: f64,
        theta_min: f64,
        theta_max: f64,
        z_fixed: f64,
    ) -> Result<Figure, CalcError> {
        let result = self
            .validate_surface_bounds(r_min, r_max, theta_min, theta_max, z_fixed)
            .and_then(|_| self.parse(expression_text))
            .and_then(|expr| {
                function_figure(
                    &expr,
                    r_min,
                    r_max,
                    theta_min,
                    theta_max,
                    z_fixed,
                    &self.binding,
                    &self.surface,
                    self.quadrature_degree,
                )
            });
        logged("build_function_figure", result)
    }

    fn validate_surface_bounds(
        &self,
        r_min: f64,
        r_max: f64,
        theta_min: f64,
        theta_max: f64,
        z_fixed: f64,
    ) -> Result<(), CalcError> {
        check_interval(self.binding.radial, r_min, r_max)?;
        check_interval(self.binding.angular, theta_min, theta_max)?;
        if !z_fixed.is_finite() {
            return Err(ValidationError::NonFiniteBound {
                variable: self.binding.vertical.to_string(),
                value: z_fixed,
            }
            .into());
        }
        Ok(())
    }
}

/// `CylindricalCalculator::evaluate` with default settings.
pub fn evaluate(
    expression_text: &str,
    r: &ArrayD<f64>,
    theta: &ArrayD<f64>,
    z: &ArrayD<f64>,
) -> Result<ArrayD<f64>, CalcError> {
    CylindricalCalculator::default().evaluate(expression_text, r, theta, z)
}

/// `CylindricalCalculator::integrate_triple` with default settings.
#[allow(clippy::too_many_arguments)]
pub fn integrate_triple(
    expression_text: &str,
    r_min: f64,
    r_max: f64,
    theta_min: f64,
    theta_max: f64,
    z_min: f64,
    z_max: f64,
) -> Result<IntegrationResult, CalcError> {
    CylindricalCalculator::default().integrate_triple(
        expression_text,
        r_min,
        r_max,
        theta_min,
        theta_max,
        z_min,
        z_max,
    )
}

pub fn build_region_figure(
    r_min: f64,
    r_max: f64,
    theta_min: f64,
    theta_max: f64,
    z_min: f64,
    z_max: f64,
) -> Figure {
    CylindricalCalculator::default().build_region_figure(
        r_min, r_max, theta_min, theta_max, z_min, z_max,
    )
}

pub fn build_function_figure(
    expression_text: &str,
    r_min: f64,
    r_max: f64,
    theta_min: f64,
    theta_max: f64,
    z_fixed: f64,
) -> Result<Figure, CalcError> {
    CylindricalCalculator::default().build_function_figure(
        expression_text,
        r_min,
        r_max,
        theta_min,
        theta_max,
        z_fixed,
    )
}
