use crate::symbolic::symbolic_engine::Expr;
use gauss_quad::GaussLegendre;
use std::cell::RefCell;
use thiserror::Error;

/// Gauss-Legendre nodes used for unevaluated integrals unless configured otherwise
pub const DEFAULT_QUADRATURE_DEGREE: usize = 32;

/// largest relative disagreement between quadratures with `degree` and `2*degree` nodes
pub const QUADRATURE_TOLERANCE: f64 = 1e-2;

/// Failures of numeric evaluation, scalar or vectorized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("{function} is undefined for argument {value}")]
    Domain { function: String, value: f64 },
    #[error("expression evaluates to a non-finite value")]
    NonFinite,
    #[error("array shapes {left:?} and {right:?} can not be broadcast together")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },
    #[error("variable '{0}' has no value")]
    UnboundVariable(String),
    #[error("quadrature failed: {0}")]
    Quadrature(String),
    #[error("numerical integral over {variable} on [{lower}, {upper}] does not converge")]
    NotConverged {
        variable: String,
        lower: f64,
        upper: f64,
    },
}

impl Expr {
    /// Evaluates the expression at one point. `vars[i]` takes the value `values[i]`; when a
    /// name appears twice the last occurrence wins.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let expr = Expr::parse_expression("r*z", &["r", "z"]).unwrap();
    /// assert_eq!(expr.eval_numeric(&["r", "z"], &[2.0, 3.0]), Ok(6.0));
    /// ```
    pub fn eval_numeric(&self, vars: &[&str], values: &[f64]) -> Result<f64, EvaluationError> {
        self.eval_numeric_with_degree(vars, values, DEFAULT_QUADRATURE_DEGREE)
    }

    /// Same as `eval_numeric` with an explicit number of quadrature nodes for `Integral` nodes.
    pub fn eval_numeric_with_degree(
        &self,
        vars: &[&str],
        values: &[f64],
        degree: usize,
    ) -> Result<f64, EvaluationError> {
        let value = self.eval_point(vars, values, degree)?;
        if !value.is_finite() {
            return Err(EvaluationError::NonFinite);
        }
        Ok(value)
    }

    /// Numerical integration of the expression over `var` using Gauss-Legendre quadrature.
    /// All other variables must be bound by `vars`/`values`.
    ///
    /// The rule with `degree` nodes is checked against the one with `2*degree` nodes. Nodes never
    /// fall on the end points, so a non-integrable singularity still gives finite sums; it shows
    /// up as sums that keep moving when nodes are added and is reported as `NotConverged`.
    pub fn quad(
        &self,
        var: &str,
        lower: f64,
        upper: f64,
        degree: usize,
        vars: &[&str],
        values: &[f64],
    ) -> Result<f64, EvaluationError> {
        let coarse = self.quad_with_nodes(var, lower, upper, degree, degree, vars, values)?;
        let fine = self.quad_with_nodes(var, lower, upper, 2 * degree, degree, vars, values)?;
        let converged = (fine - coarse).abs() <= QUADRATURE_TOLERANCE * fine.abs().max(1.0);
        if !converged {
            return Err(EvaluationError::NotConverged {
                variable: var.to_string(),
                lower,
                upper,
            });
        }
        Ok(fine)
    }

    /// one Gauss-Legendre rule with `nodes` points; nested integrals use `degree`
    fn quad_with_nodes(
        &self,
        var: &str,
        lower: f64,
        upper: f64,
        nodes: usize,
        degree: usize,
        vars: &[&str],
        values: &[f64],
    ) -> Result<f64, EvaluationError> {
        let quad = GaussLegendre::new(nodes).map_err(|e| {
            EvaluationError::Quadrature(format!(
                "Failed to create Gauss-Legendre quadrature: {:?}",
                e
            ))
        })?;
        let mut names = vars.to_vec();
        names.push(var);
        // the first failure inside the integrand is reported after integration
        let failure: RefCell<Option<EvaluationError>> = RefCell::new(None);
        let f = |t: f64| {
            let mut point = values.to_vec();
            point.push(t);
            match self.eval_point(&names, &point, degree) {
                Ok(value) => value,
                Err(e) => {
                    failure.borrow_mut().get_or_insert(e);
                    f64::NAN
                }
            }
        };
        let result = quad.integrate(lower, upper, f);
        if let Some(e) = failure.into_inner() {
            return Err(e);
        }
        Ok(result)
    }

    pub(crate) fn eval_point(
        &self,
        vars: &[&str],
        values: &[f64],
        degree: usize,
    ) -> Result<f64, EvaluationError> {
        match self {
            Expr::Var(name) => vars
                .iter()
                .rposition(|v| v == name)
                .and_then(|i| values.get(i).copied())
                .ok_or_else(|| EvaluationError::UnboundVariable(name.clone())),
            Expr::Const(val) => Ok(*val),
            Expr::Add(lhs, rhs) => {
                Ok(lhs.eval_point(vars, values, degree)? + rhs.eval_point(vars, values, degree)?)
            }
            Expr::Sub(lhs, rhs) => {
                Ok(lhs.eval_point(vars, values, degree)? - rhs.eval_point(vars, values, degree)?)
            }
            Expr::Mul(lhs, rhs) => {
                Ok(lhs.eval_point(vars, values, degree)? * rhs.eval_point(vars, values, degree)?)
            }
            Expr::Div(lhs, rhs) => {
                let numerator = lhs.eval_point(vars, values, degree)?;
                let denominator = rhs.eval_point(vars, values, degree)?;
                if denominator == 0.0 {
                    return Err(EvaluationError::DivisionByZero);
                }
                Ok(numerator / denominator)
            }
            Expr::Pow(base, exp) => {
                let base = base.eval_point(vars, values, degree)?;
                let exp = exp.eval_point(vars, values, degree)?;
                power(base, exp)
            }
            Expr::Exp(arg) => Ok(arg.eval_point(vars, values, degree)?.exp()),
            Expr::Ln(arg) => logarithm(arg.eval_point(vars, values, degree)?),
            Expr::sin(arg) => Ok(arg.eval_point(vars, values, degree)?.sin()),
            Expr::cos(arg) => Ok(arg.eval_point(vars, values, degree)?.cos()),
            Expr::tg(arg) => Ok(arg.eval_point(vars, values, degree)?.tan()),
            Expr::Abs(arg) => Ok(arg.eval_point(vars, values, degree)?.abs()),
            Expr::Integral(inner, var, lower, upper) => {
                inner.quad(var, *lower, *upper, degree, vars, values)
            }
        }
    }
}

/// real power with the domain checks shared by both evaluators
pub(crate) fn power(base: f64, exp: f64) -> Result<f64, EvaluationError> {
    if base == 0.0 && exp < 0.0 {
        return Err(EvaluationError::DivisionByZero);
    }
    if base < 0.0 && exp.fract() != 0.0 {
        return Err(EvaluationError::Domain {
            function: "pow".to_string(),
            value: base,
        });
    }
    Ok(base.powf(exp))
}

pub(crate) fn logarithm(x: f64) -> Result<f64, EvaluationError> {
    if x <= 0.0 {
        return Err(EvaluationError::Domain {
            function: "log".to_string(),
            value: x,
        });
    }
    Ok(x.ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{E, PI};

    const VARS: [&str; 3] = ["r", "theta", "z"];

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input, &VARS).unwrap()
    }

    #[test]
    fn test_eval_point() {
        let value = parse("r*cos(theta) + z^2").eval_numeric(&VARS, &[2.0, 0.0, 3.0]).unwrap();
        assert_relative_eq!(value, 11.0);
        let value = parse("sqrt(r)*log(e)").eval_numeric(&VARS, &[4.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(value, 2.0);
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(
            parse("1/z").eval_numeric(&VARS, &[1.0, 1.0, 0.0]),
            Err(EvaluationError::DivisionByZero)
        );
        assert!(matches!(
            parse("log(r)").eval_numeric(&VARS, &[-1.0, 0.0, 0.0]),
            Err(EvaluationError::Domain { .. })
        ));
        assert!(matches!(
            parse("sqrt(z)").eval_numeric(&VARS, &[0.0, 0.0, -4.0]),
            Err(EvaluationError::Domain { .. })
        ));
        assert_eq!(
            parse("exp(z)").eval_numeric(&VARS, &[0.0, 0.0, 1000.0]),
            Err(EvaluationError::NonFinite)
        );
    }

    #[test]
    fn test_unbound_variable() {
        assert_eq!(
            parse("r*z").eval_numeric(&["r"], &[1.0]),
            Err(EvaluationError::UnboundVariable("z".to_string()))
        );
    }

    #[test]
    fn test_quad_against_closed_form() {
        let value = parse("exp(z)").quad("z", 0.0, 1.0, 16, &[], &[]).unwrap();
        assert_relative_eq!(value, E - 1.0, epsilon = 1e-12);
        let value = parse("r*sin(theta)").quad("theta", 0.0, PI, 32, &["r"], &[3.0]).unwrap();
        assert_relative_eq!(value, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unevaluated_integral_is_evaluated_by_quadrature() {
        // ∫0^1 exp(z^2) dz = 1.4626517459071816
        let integral = Expr::Integral(Box::new(parse("exp(z^2)")), "z".to_string(), 0.0, 1.0);
        let value = integral.eval_numeric(&[], &[]).unwrap();
        assert_relative_eq!(value, 1.4626517459071816, epsilon = 1e-10);

        // the inner variable shadows an outer binding with the same name
        let value = integral.eval_numeric(&["z"], &[100.0]).unwrap();
        assert_relative_eq!(value, 1.4626517459071816, epsilon = 1e-10);
    }

    #[test]
    fn test_non_integrable_singularity_does_not_converge() {
        // 1/sin has poles at both ends of [0, pi]
        let integral = Expr::Integral(Box::new(parse("1/sin(theta)")), "theta".to_string(), 0.0, PI);
        assert_eq!(
            integral.eval_numeric(&[], &[]),
            Err(EvaluationError::NotConverged {
                variable: "theta".to_string(),
                lower: 0.0,
                upper: PI,
            })
        );
        // an integrable one still passes: ∫0^1 z^(-1/2) dz = 2
        let value = parse("z^(-0.5)").quad("z", 0.0, 1.0, 32, &[], &[]).unwrap();
        assert_relative_eq!(value, 2.0, epsilon = 2e-2);
    }

    #[test]
    fn test_error_inside_quadrature_is_reported() {
        let integral = Expr::Integral(Box::new(parse("log(z)")), "z".to_string(), -1.0, 1.0);
        assert!(matches!(
            integral.eval_numeric(&[], &[]),
            Err(EvaluationError::Domain { .. })
        ));
    }
}
