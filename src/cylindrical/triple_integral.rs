//! Triple integral in cylindrical coordinates.
//!
//! The integrand is always `f * r` and the integration order is fixed: z first, then theta,
//! then r, i.e. `∫ ∫ ∫ f r dz dθ dr` read from the inside out.

use crate::cylindrical::binding::VariableBinding;
use crate::cylindrical::bounds::IntegrationBounds;
use crate::cylindrical::error::CalcError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_integration::IntegrationError;
use crate::symbolic::symbolic_lambdify::EvaluationError;
use log::{debug, info};

/// Outcome of one triple integral.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationResult {
    /// function text as entered
    pub expression_text: String,
    /// `f * r`, the expression handed to the first integration
    pub integrand: Expr,
    pub after_z: Expr,
    pub after_theta: Expr,
    /// the final expression, after integration over r
    pub result: Expr,
    /// numeric value of `result` when it can be computed
    pub value: Option<f64>,
    pub bounds: IntegrationBounds,
}

impl IntegrationResult {
    /// Six decimals when the value is numeric, the symbolic form otherwise.
    pub fn display_value(&self) -> String {
        match self.value {
            Some(value) => format!("{:.6}", value),
            None => self.result.to_string(),
        }
    }

    pub fn integrand_line(&self) -> String {
        format!("({}) × r = {}", self.expression_text, self.integrand)
    }

    /// LaTeX of the integral statement
    pub fn latex(&self) -> String {
        let b = &self.bounds;
        format!(
            "\\int_{{{}}}^{{{}}}\\int_{{{}}}^{{{}}}\\int_{{{}}}^{{{}}} ({}) \\cdot r \\, dz \\, d\\theta \\, dr",
            b.r_min, b.r_max, b.theta_min, b.theta_max, b.z_min, b.z_max, self.expression_text
        )
    }
}

/// `expr * r`, structurally `Mul(expr, Var(radial))`.
pub fn jacobian_integrand(expr: &Expr, binding: &VariableBinding) -> Expr {
    Expr::Mul(
        Box::new(expr.clone()),
        Box::new(Expr::Var(binding.radial.to_string())),
    )
}

/// Integrates `expr * r` over the box: z, then theta, then r.
///
/// Bounds must already be validated. A divergent step fails the whole computation, and so does
/// an unevaluated integral whose quadrature does not converge. A final expression that can not
/// be turned into a number for other reasons is kept symbolic with `value = None`.
pub fn integrate_cylindrical(
    expr: &Expr,
    expression_text: &str,
    bounds: &IntegrationBounds,
    binding: &VariableBinding,
    quadrature_degree: usize,
) -> Result<IntegrationResult, CalcError> {
    let integrand = jacobian_integrand(expr, binding);
    debug!("integrand: {}", integrand);

    let after_z = integrand.definite_integral(binding.vertical, bounds.z_min, bounds.z_max)?;
    debug!("after {}: {}", binding.vertical, after_z);
    let after_theta =
        after_z.definite_integral(binding.angular, bounds.theta_min, bounds.theta_max)?;
    debug!("after {}: {}", binding.angular, after_theta);
    let result = after_theta.definite_integral(binding.radial, bounds.r_min, bounds.r_max)?;

    let value = match result.eval_numeric_with_degree(&[], &[], quadrature_degree) {
        Ok(value) => Some(value),
        Err(EvaluationError::NotConverged {
            variable,
            lower,
            upper,
        }) => {
            return Err(IntegrationError::Divergent {
                variable,
                lower,
                upper,
            }
            .into());
        }
        Err(e) => {
            debug!("result kept symbolic: {}", e);
            None
        }
    };
    info!(
        "∭ ({}) r dz dθ dr = {}",
        expression_text,
        value.map_or_else(|| result.to_string(), |v| v.to_string())
    );

    Ok(IntegrationResult {
        expression_text: expression_text.to_string(),
        integrand,
        after_z,
        after_theta,
        result,
        value,
        bounds: *bounds,
    })
}
