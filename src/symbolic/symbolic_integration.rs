use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::{Term, collect, terms_to_expr};
use log::debug;
use std::f64::consts::PI;
use thiserror::Error;

/// Failures of a definite integration step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("integral over {variable} diverges on [{lower}, {upper}]")]
    Divergent {
        variable: String,
        lower: f64,
        upper: f64,
    },
    #[error("integration interval for {variable} is not finite: [{lower}, {upper}]")]
    InvalidInterval {
        variable: String,
        lower: f64,
        upper: f64,
    },
}

fn var_expr(var: &str) -> Expr {
    Expr::Var(var.to_string())
}

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral (without constant of integration).
    /// Returns None if some term of the expanded expression has no closed form in the rule table.
    pub fn integrate(&self, var: &str) -> Option<Expr> {
        let mut pieces = Vec::new();
        for term in collect(self.expand_terms()) {
            let (dependent, independent) = split_factors(&term, var);
            let outer = Term::new(term.coeff, independent).to_expr();
            let inner = if dependent.is_empty() {
                var_expr(var)
            } else {
                antiderivative(&dependent, var)?
            };
            pieces.push(outer * inner);
        }
        let sum = pieces
            .into_iter()
            .reduce(|acc, piece| acc + piece)
            .unwrap_or(Expr::Const(0.0));
        Some(sum.simplify().collect_terms())
    }

    /// Definite integral over `var` from `lower` to `upper`.
    ///
    /// Each term of the expanded expression is integrated with the rule table and the
    /// fundamental theorem of calculus; a term with no closed form is kept as an unevaluated
    /// `Integral` node, so the result may still be symbolic. A pole inside or on the interval,
    /// or a non-finite value at a bound, is an `IntegrationError::Divergent`.
    pub fn definite_integral(
        &self,
        var: &str,
        lower: f64,
        upper: f64,
    ) -> Result<Expr, IntegrationError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(IntegrationError::InvalidInterval {
                variable: var.to_string(),
                lower,
                upper,
            });
        }
        let divergent = || IntegrationError::Divergent {
            variable: var.to_string(),
            lower,
            upper,
        };

        let mut pieces = Vec::new();
        for term in collect(self.expand_terms()) {
            pieces.push(definite_term(&term, var, lower, upper)?);
        }
        let sum = pieces
            .into_iter()
            .reduce(|acc, piece| acc + piece)
            .unwrap_or(Expr::Const(0.0));
        let result = sum.simplify().collect_terms().simplify();
        if result.is_singular() {
            return Err(divergent());
        }
        debug!("integral over {} on [{}, {}] = {}", var, lower, upper, result);
        Ok(result)
    }
}

/// (factors depending on var, factors free of var)
fn split_factors(term: &Term, var: &str) -> (Vec<(Expr, f64)>, Vec<(Expr, f64)>) {
    term.factors
        .iter()
        .cloned()
        .partition(|(base, _)| base.contains_variable(var))
}

fn definite_term(term: &Term, var: &str, lower: f64, upper: f64) -> Result<Expr, IntegrationError> {
    let divergent = || IntegrationError::Divergent {
        variable: var.to_string(),
        lower,
        upper,
    };
    let (dependent, independent) = split_factors(term, var);
    let outer = Term::new(term.coeff, independent).to_expr();
    if dependent.is_empty() {
        return Ok(outer * Expr::Const(upper - lower));
    }
    if has_pole(&dependent, var, lower, upper) {
        return Err(divergent());
    }

    let primitive = if has_moving_pole(&dependent, var) {
        None
    } else {
        antiderivative(&dependent, var)
    };
    match primitive {
        Some(primitive) => {
            let at_upper = primitive.set_variable(var, upper).simplify();
            let at_lower = primitive.set_variable(var, lower).simplify();
            if at_upper.is_singular() || at_lower.is_singular() {
                return Err(divergent());
            }
            Ok(outer * (at_upper - at_lower))
        }
        None => {
            let integrand = Term::new(1.0, dependent).to_expr();
            debug!("no closed form for {} d{}, kept unevaluated", integrand, var);
            Ok(outer * Expr::Integral(Box::new(integrand), var.to_string(), lower, upper))
        }
    }
}

/// `expr = a*var + b` with a, b free of var and a not identically zero
fn linear_coefficients(expr: &Expr, var: &str) -> Option<(Expr, Expr)> {
    let mut slope = Vec::new();
    let mut intercept = Vec::new();
    for term in expr.expand_terms() {
        let (dependent, independent) = split_factors(&term, var);
        let rest = Term::new(term.coeff, independent);
        match dependent.as_slice() {
            [] => intercept.push(rest),
            [(Expr::Var(name), power)] if name == var && *power == 1.0 => slope.push(rest),
            _ => return None,
        }
    }
    let slope = collect(slope);
    if slope.is_empty() {
        return None;
    }
    Some((terms_to_expr(&slope), terms_to_expr(&collect(intercept))))
}

/// root of a*var + b when both coefficients are numbers
fn numeric_root(a: &Expr, b: &Expr) -> Option<f64> {
    match (a.simplify().as_const(), b.simplify().as_const()) {
        (Some(a), Some(b)) if a != 0.0 => Some(-b / a),
        _ => None,
    }
}

/// numeric nonzero `a` of `expr = a*var + b`; a slope that depends on other variables may
/// vanish inside their ranges, so it is not accepted
fn linear_slope(expr: &Expr, var: &str) -> Option<Expr> {
    let (a, _) = linear_coefficients(expr, var)?;
    let a = a.simplify().as_const().filter(|a| *a != 0.0 && a.is_finite())?;
    Some(Expr::Const(a))
}

/// Factors whose singular point moves with the other variables: `(a*x + b)^p` with p <= -1
/// or `tg(a*x + b)` where a or b is not a number.
fn has_moving_pole(factors: &[(Expr, f64)], var: &str) -> bool {
    factors.iter().any(|(base, power)| {
        let arg = match base {
            Expr::tg(arg) if *power > 0.0 => arg.as_ref(),
            _ if *power <= -1.0 => base,
            _ => return false,
        };
        match linear_coefficients(arg, var) {
            Some((a, b)) => numeric_root(&a, &b).is_none(),
            None => false,
        }
    })
}

/// Non-integrable singularities of the factors inside or on [lower, upper]:
/// `(a*x + b)^p` with p <= -1 at its root and `tg(a*x + b)` at an odd multiple of pi/2.
fn has_pole(factors: &[(Expr, f64)], var: &str, lower: f64, upper: f64) -> bool {
    let (lo, hi) = (lower.min(upper), lower.max(upper));
    factors.iter().any(|(base, power)| {
        if *power <= -1.0 {
            if let Some((a, b)) = linear_coefficients(base, var) {
                if let Some(root) = numeric_root(&a, &b) {
                    return lo <= root && root <= hi;
                }
            }
        }
        if let Expr::tg(arg) = base {
            if *power > 0.0 {
                if let Some((a, b)) = linear_coefficients(arg, var) {
                    if let (Some(a), Some(b)) = (a.simplify().as_const(), b.simplify().as_const()) {
                        let (u0, u1) = (a * lo + b, a * hi + b);
                        let (u_lo, u_hi) = (u0.min(u1), u0.max(u1));
                        // smallest pi/2 + k*pi that is >= u_lo
                        let k = ((u_lo - PI / 2.0) / PI).ceil();
                        return PI / 2.0 + k * PI <= u_hi;
                    }
                }
            }
        }
        false
    })
}

/// Antiderivative of a product of factors that all depend on var.
fn antiderivative(factors: &[(Expr, f64)], var: &str) -> Option<Expr> {
    match factors {
        [(base, power)] => single_factor(base, *power, var),
        [first, second] => {
            pair_of_factors(first, second, var).or_else(|| pair_of_factors(second, first, var))
        }
        _ => None,
    }
}

fn single_factor(base: &Expr, power: f64, var: &str) -> Option<Expr> {
    let x = var_expr(var);
    // ∫ (a*x + b)^n dx
    if let Some(a) = linear_slope(base, var) {
        if power == -1.0 {
            return Some(Expr::Ln(Box::new(Expr::Abs(Box::new(base.clone())))) / a);
        }
        let raised = base.clone().pow(Expr::Const(power + 1.0));
        return Some(raised / (Expr::Const(power + 1.0) * a));
    }
    match base {
        // ∫ e^(a*x + b) dx = e^(a*x + b) / a
        Expr::Exp(arg) if power == 1.0 => {
            let a = linear_slope(arg, var)?;
            Some(base.clone() / a)
        }
        // ∫ c^(a*x + b) dx = c^(a*x + b) / (a ln c)
        Expr::Pow(c, arg) if power == 1.0 => {
            let c = c.as_const().filter(|c| *c > 0.0 && *c != 1.0)?;
            let a = linear_slope(arg, var)?;
            Some(base.clone() / (a * Expr::Const(c.ln())))
        }
        Expr::sin(arg) => {
            let a = linear_slope(arg, var)?;
            match power {
                // -cos(u)/a
                p if p == 1.0 => Some(-(Expr::cos(arg.clone()) / a)),
                // x/2 - sin(2u)/(4a)
                p if p == 2.0 => Some(
                    x / Expr::Const(2.0)
                        - Expr::sin(Box::new(Expr::Const(2.0) * *arg.clone()))
                            / (Expr::Const(4.0) * a),
                ),
                _ => None,
            }
        }
        Expr::cos(arg) => {
            let a = linear_slope(arg, var)?;
            match power {
                // sin(u)/a
                p if p == 1.0 => Some(Expr::sin(arg.clone()) / a),
                // x/2 + sin(2u)/(4a)
                p if p == 2.0 => Some(
                    x / Expr::Const(2.0)
                        + Expr::sin(Box::new(Expr::Const(2.0) * *arg.clone()))
                            / (Expr::Const(4.0) * a),
                ),
                _ => None,
            }
        }
        Expr::tg(arg) => {
            let a = linear_slope(arg, var)?;
            match power {
                // -ln|cos(u)|/a
                p if p == 1.0 => Some(
                    -(Expr::Ln(Box::new(Expr::Abs(Box::new(Expr::cos(arg.clone()))))) / a),
                ),
                // tg(u)/a - x
                p if p == 2.0 => Some(Expr::tg(arg.clone()) / a - x),
                _ => None,
            }
        }
        // ∫ ln(u) dx = (u ln(u) - u)/a
        Expr::Ln(arg) if power == 1.0 => {
            let a = linear_slope(arg, var)?;
            let u = *arg.clone();
            Some((u.clone() * Expr::Ln(arg.clone()) - u) / a)
        }
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Oscillator {
    Exp,
    Sin,
    Cos,
}

fn pair_of_factors(first: &(Expr, f64), second: &(Expr, f64), var: &str) -> Option<Expr> {
    let (base, power) = first;
    let (other, other_power) = second;
    if *other_power != 1.0 {
        return None;
    }
    let x = var_expr(var);

    if *base == x {
        // x^n * ln(x)
        if let Expr::Ln(arg) = other {
            if **arg == x {
                return Some(power_times_log(*power, var));
            }
        }
        // x^n * exp/sin/cos(a*x + b), n a positive integer
        if power.fract() == 0.0 && *power > 0.0 {
            let (kind, arg) = match other {
                Expr::Exp(arg) => (Oscillator::Exp, arg),
                Expr::sin(arg) => (Oscillator::Sin, arg),
                Expr::cos(arg) => (Oscillator::Cos, arg),
                _ => return None,
            };
            let a = linear_slope(arg, var)?;
            return Some(by_parts(*power as u32, kind, arg, &a, var));
        }
        return None;
    }

    // sin(u) * cos(u) = (sin(u)^2)' / (2a)
    if let (Expr::sin(u), Expr::cos(v)) = (base, other) {
        if u == v && *power == 1.0 {
            let a = linear_slope(u, var)?;
            return Some(
                Expr::sin(u.clone()).pow(Expr::Const(2.0)) / (Expr::Const(2.0) * a),
            );
        }
    }
    None
}

/// ∫ x^n ln(x) dx = x^(n+1) (ln(x)/(n+1) - 1/(n+1)^2), and ln(x)^2/2 for n = -1
fn power_times_log(n: f64, var: &str) -> Expr {
    let x = var_expr(var);
    if n == -1.0 {
        return x.ln().pow(Expr::Const(2.0)) / Expr::Const(2.0);
    }
    let m = n + 1.0;
    x.clone().pow(Expr::Const(m)) * (x.ln() / Expr::Const(m) - Expr::Const(1.0 / (m * m)))
}

/// Integration by parts, recursively lowering the power of x:
///   ∫ x^n e^u  = x^n e^u / a      - (n/a) ∫ x^(n-1) e^u
///   ∫ x^n sin u = -x^n cos u / a  + (n/a) ∫ x^(n-1) cos u
///   ∫ x^n cos u = x^n sin u / a   - (n/a) ∫ x^(n-1) sin u
fn by_parts(n: u32, kind: Oscillator, arg: &Box<Expr>, a: &Expr, var: &str) -> Expr {
    let base = match kind {
        Oscillator::Exp => Expr::Exp(arg.clone()),
        Oscillator::Sin => -Expr::cos(arg.clone()),
        Oscillator::Cos => Expr::sin(arg.clone()),
    };
    if n == 0 {
        return base / a.clone();
    }
    let xn = var_expr(var).pow(Expr::Const(n as f64));
    let ratio = Expr::Const(n as f64) / a.clone();
    let first = xn * base / a.clone();
    match kind {
        Oscillator::Exp => first - ratio * by_parts(n - 1, Oscillator::Exp, arg, a, var),
        Oscillator::Sin => first + ratio * by_parts(n - 1, Oscillator::Cos, arg, a, var),
        Oscillator::Cos => first - ratio * by_parts(n - 1, Oscillator::Sin, arg, a, var),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////
// tests
////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod integration_tests {

    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{E, PI};

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input, &["r", "theta", "z", "x"]).unwrap()
    }

    fn definite(input: &str, var: &str, lower: f64, upper: f64) -> f64 {
        let result = parse(input).definite_integral(var, lower, upper).unwrap();
        result
            .as_const()
            .unwrap_or_else(|| panic!("{} is not a number", result))
    }

    #[test]
    fn test_integrate_constant_and_polynomial() {
        assert_relative_eq!(definite("5", "x", 0.0, 2.0), 10.0, epsilon = 1e-12);
        assert_relative_eq!(definite("x", "x", 0.0, 2.0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(definite("3*x^2 + 2*x + 1", "x", 0.0, 1.0), 3.0, epsilon = 1e-12);
        assert_relative_eq!(definite("(x + 1)^3", "x", 0.0, 1.0), 3.75, epsilon = 1e-12);
    }

    #[test]
    fn test_indefinite_integral_of_power() {
        let primitive = parse("x^2").integrate("x").unwrap();
        let value = primitive.set_variable("x", 3.0).simplify();
        assert_relative_eq!(value.as_const().unwrap(), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_other_variables_are_constants() {
        // ∫0^2 r*z dz = 2r
        let result = parse("r*z").definite_integral("z", 0.0, 2.0).unwrap();
        assert_eq!(result, Expr::Const(2.0) * Expr::Var("r".to_string()));
    }

    #[test]
    fn test_reciprocal_and_logarithm() {
        assert_relative_eq!(definite("1/x", "x", 1.0, E), 1.0, epsilon = 1e-12);
        assert_relative_eq!(definite("1/(2*x + 1)", "x", 0.0, 1.0), 3f64.ln() / 2.0, epsilon = 1e-12);
        // ∫0^1 ln(x) dx = -1, the endpoint x ln x -> 0
        assert_relative_eq!(definite("log(x)", "x", 0.0, 1.0), -1.0, epsilon = 1e-12);
        // ∫1^e x ln(x) dx = (e^2 + 1)/4
        assert_relative_eq!(definite("x*log(x)", "x", 1.0, E), (E * E + 1.0) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exponentials() {
        assert_relative_eq!(definite("exp(-z)", "z", 0.0, 1.0), 1.0 - (-1f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(definite("2^x", "x", 0.0, 1.0), 1.0 / 2f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(definite("e^x", "x", 0.0, 1.0), E - 1.0, epsilon = 1e-12);
        // by parts: ∫0^1 x e^x dx = 1, ∫0^1 x^2 e^x dx = e - 2
        assert_relative_eq!(definite("x*exp(x)", "x", 0.0, 1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(definite("x^2*exp(x)", "x", 0.0, 1.0), E - 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trigonometric() {
        assert_relative_eq!(definite("sin(theta)", "theta", 0.0, PI), 2.0, epsilon = 1e-12);
        assert_relative_eq!(definite("cos(2*theta)", "theta", 0.0, PI / 4.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(definite("sin(theta)^2", "theta", 0.0, 2.0 * PI), PI, epsilon = 1e-12);
        assert_relative_eq!(definite("cos(theta)^2", "theta", 0.0, PI), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(definite("sin(theta)*cos(theta)", "theta", 0.0, PI / 2.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(definite("tan(theta)", "theta", 0.0, PI / 4.0), 2f64.ln() / 2.0, epsilon = 1e-12);
        // ∫0^pi x sin(x) dx = pi
        assert_relative_eq!(definite("x*sin(x)", "x", 0.0, PI), PI, epsilon = 1e-12);
        // ∫0^pi/2 x cos(x) dx = pi/2 - 1
        assert_relative_eq!(definite("x*cos(x)", "x", 0.0, PI / 2.0), PI / 2.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_poles_are_divergent() {
        let err = parse("1/x").definite_integral("x", -1.0, 1.0).unwrap_err();
        assert!(matches!(err, IntegrationError::Divergent { .. }));
        assert!(parse("1/x^2").definite_integral("x", 0.0, 1.0).is_err());
        assert!(parse("tan(theta)").definite_integral("theta", 0.0, 2.0).is_err());
        assert!(parse("1/(x - 1)").definite_integral("x", 0.0, 1.0).is_err());
        // integrable endpoint singularity
        assert_relative_eq!(definite("x^(-0.5)", "x", 0.0, 1.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_symbolic_slope_stays_unevaluated() {
        // dividing by theta would put a pole at theta = 0
        let result = parse("sin(theta*z)").definite_integral("z", 0.0, 1.0).unwrap();
        assert!(result.has_unevaluated_integral());
        assert!(!result.contains_variable("z"));
        assert!(result.contains_variable("theta"));
        assert!(parse("exp(r*x)").integrate("x").is_none());
        // a numeric slope still has a closed form
        assert_relative_eq!(definite("sin(2*theta)", "theta", 0.0, PI / 2.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pole_moving_with_other_variable_stays_unevaluated() {
        let result = parse("1/(r - theta)").definite_integral("theta", 0.0, PI).unwrap();
        assert!(result.has_unevaluated_integral());
        let result = parse("tan(theta + r)").definite_integral("theta", 0.0, 1.0).unwrap();
        assert!(result.has_unevaluated_integral());
    }

    #[test]
    fn test_invalid_interval() {
        let err = parse("x").definite_integral("x", 0.0, f64::INFINITY).unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidInterval { .. }));
    }

    #[test]
    fn test_no_closed_form_stays_unevaluated() {
        let result = parse("exp(x^2)").definite_integral("x", 0.0, 1.0).unwrap();
        assert!(result.has_unevaluated_integral());
        // constant factors are pulled out of the unevaluated integral
        let result = parse("3*r*exp(x^2)").definite_integral("x", 0.0, 1.0).unwrap();
        assert!(result.has_unevaluated_integral());
        assert!(result.contains_variable("r"));
        assert!(!result.contains_variable("x"));
    }

    #[test]
    fn test_sequential_integration_of_cylinder() {
        let integrand = parse("1") * Expr::Var("r".to_string());
        let after_z = integrand.definite_integral("z", 0.0, 3.0).unwrap();
        let after_theta = after_z.definite_integral("theta", 0.0, 2.0 * PI).unwrap();
        let after_r = after_theta.definite_integral("r", 0.0, 2.0).unwrap();
        assert_relative_eq!(after_r.as_const().unwrap(), 12.0 * PI, epsilon = 1e-10);
    }
}
