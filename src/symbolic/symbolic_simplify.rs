//! # Symbolic Expression Simplification Module
//!
//! Two layers of simplification used by the integrator:
//!
//! 1. **`simplify()`**: bottom-up constant folding and algebraic identities
//!    (`x + 0 = x`, `x * 1 = x`, `0 * x = 0`, `x ^ 1 = x`, ...). A constant operation is
//!    folded only when its value is finite, so `ln(0)` or `1 / 0` stay in the tree and can be
//!    detected afterwards with `is_singular()`.
//! 2. **Term expansion and collection**: an expression is expanded into a sum of [`Term`]s
//!    (coefficient times a product of factors raised to numeric powers), like terms are
//!    merged and the sum is rebuilt with `collect_terms()`.
//!
//! ## Key Features
//!
//! - **Distributive Property**: products of sums and small integer powers of sums are expanded
//! - **Like Term Collection**: `3*r*z + 2*z*r = 5*r*z`
//! - **Power Merging**: `r * r^2 = r^3`, `sqrt(r) * sqrt(r) = r`
//! - **Exponential Merging**: `exp(a) * exp(b) = exp(a + b)`
//!
//! The `0 * x = 0` rule fires even when `x` is singular; this is what turns the endpoint value
//! of `x * ln(x)` at `x = 0` into its limit.

use crate::symbolic::symbolic_engine::Expr;
use itertools::Itertools;
use std::f64::consts::E;

/// highest integer power of a sum that is multiplied out
const MAX_EXPANDED_POWER: f64 = 6.0;

/// fold a constant operation only if the result is a finite number
fn folded(value: f64, fallback: Expr) -> Expr {
    if value.is_finite() {
        Expr::Const(value)
    } else {
        fallback
    }
}

fn negated(expr: Expr) -> Expr {
    match expr {
        Expr::Const(val) => Expr::Const(-val),
        Expr::Mul(lhs, rhs) => match *lhs {
            Expr::Const(val) => Expr::Mul(Box::new(Expr::Const(-val)), rhs),
            lhs => Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(Expr::Mul(Box::new(lhs), rhs))),
        },
        other => Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(other)),
    }
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Constant folding plus the basic identities, applied bottom-up.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        folded(a + b, Expr::Add(Box::new(lhs.clone()), Box::new(rhs.clone())))
                    }
                    _ if lhs.is_zero() => rhs,
                    _ if rhs.is_zero() => lhs,
                    _ => Expr::Add(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        folded(a - b, Expr::Sub(Box::new(lhs.clone()), Box::new(rhs.clone())))
                    }
                    _ if rhs.is_zero() => lhs,
                    _ if lhs.is_zero() => negated(rhs),
                    _ => Expr::Sub(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                if lhs.is_zero() || rhs.is_zero() {
                    return Expr::Const(0.0);
                }
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        folded(a * b, Expr::Mul(Box::new(lhs.clone()), Box::new(rhs.clone())))
                    }
                    (Expr::Const(a), _) if *a == 1.0 => rhs,
                    (_, Expr::Const(b)) if *b == 1.0 => lhs,
                    // c1 * (c2 * x) = (c1 * c2) * x
                    (Expr::Const(a), Expr::Mul(inner_lhs, inner_rhs)) => match inner_lhs.as_ref() {
                        Expr::Const(b) if (a * b).is_finite() => {
                            Expr::Mul(Box::new(Expr::Const(a * b)), inner_rhs.clone())
                        }
                        _ => Expr::Mul(Box::new(lhs.clone()), Box::new(rhs.clone())),
                    },
                    _ => Expr::Mul(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Div(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => {
                        folded(a / b, Expr::Div(Box::new(lhs.clone()), Box::new(rhs.clone())))
                    }
                    (_, Expr::Const(b)) if *b == 0.0 => Expr::Div(Box::new(lhs), Box::new(rhs)),
                    _ if lhs.is_zero() => Expr::Const(0.0),
                    (_, Expr::Const(b)) if *b == 1.0 => lhs,
                    _ => Expr::Div(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Pow(base, exp) => {
                let base = base.simplify();
                let exp = exp.simplify();
                match (&base, &exp) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        let value = a.powf(*b);
                        folded(value, Expr::Pow(Box::new(base.clone()), Box::new(exp.clone())))
                    }
                    (_, Expr::Const(b)) if *b == 0.0 => Expr::Const(1.0),
                    (_, Expr::Const(b)) if *b == 1.0 => base,
                    (Expr::Const(a), _) if *a == 1.0 => Expr::Const(1.0),
                    _ => Expr::Pow(Box::new(base), Box::new(exp)),
                }
            }
            Expr::Exp(arg) => {
                let arg = arg.simplify();
                match arg {
                    Expr::Const(val) => folded(val.exp(), Expr::Exp(Box::new(arg))),
                    Expr::Ln(inner) => *inner,
                    _ => Expr::Exp(Box::new(arg)),
                }
            }
            Expr::Ln(arg) => {
                let arg = arg.simplify();
                match arg {
                    Expr::Const(val) if val > 0.0 => Expr::Const(val.ln()),
                    Expr::Exp(inner) => *inner,
                    _ => Expr::Ln(Box::new(arg)),
                }
            }
            Expr::sin(arg) => {
                let arg = arg.simplify();
                match arg {
                    Expr::Const(val) => folded(val.sin(), Expr::sin(Box::new(arg))),
                    _ => Expr::sin(Box::new(arg)),
                }
            }
            Expr::cos(arg) => {
                let arg = arg.simplify();
                match arg {
                    Expr::Const(val) => folded(val.cos(), Expr::cos(Box::new(arg))),
                    _ => Expr::cos(Box::new(arg)),
                }
            }
            Expr::tg(arg) => {
                let arg = arg.simplify();
                match arg {
                    Expr::Const(val) => folded(val.tan(), Expr::tg(Box::new(arg))),
                    _ => Expr::tg(Box::new(arg)),
                }
            }
            Expr::Abs(arg) => {
                let arg = arg.simplify();
                match arg {
                    Expr::Const(val) => folded(val.abs(), Expr::Abs(Box::new(arg))),
                    _ => Expr::Abs(Box::new(arg)),
                }
            }
            Expr::Integral(inner, var, lower, upper) => {
                let inner = inner.simplify();
                if inner.contains_variable(var) {
                    Expr::Integral(Box::new(inner), var.clone(), *lower, *upper)
                } else {
                    Expr::Mul(Box::new(inner), Box::new(Expr::Const(upper - lower))).simplify()
                }
            }
        }
    }

    /// true if a simplified expression holds a value that is not a finite real number
    /// (`ln(0)`, `1 / 0`, `(-1) ^ 0.5`, ...). Meaningful only after `simplify()`, which folds
    /// every constant operation with a finite result.
    pub fn is_singular(&self) -> bool {
        match self {
            Expr::Const(val) => !val.is_finite(),
            Expr::Var(_) => false,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                (lhs.as_const().is_some() && rhs.as_const().is_some())
                    || lhs.is_singular()
                    || rhs.is_singular()
            }
            Expr::Exp(arg)
            | Expr::Ln(arg)
            | Expr::sin(arg)
            | Expr::cos(arg)
            | Expr::tg(arg)
            | Expr::Abs(arg) => arg.as_const().is_some() || arg.is_singular(),
            Expr::Integral(inner, _, _, _) => inner.is_singular(),
        }
    }

    //___________________________________TERM COLLECTION____________________________________

    /// Expands the expression into a list of terms whose sum equals the expression.
    /// An empty list stands for zero.
    pub fn expand_terms(&self) -> Vec<Term> {
        match self {
            Expr::Const(val) => constant_terms(*val),
            Expr::Var(_) => vec![Term::factor(self.clone(), 1.0)],
            Expr::Add(lhs, rhs) => {
                let mut terms = lhs.expand_terms();
                terms.extend(rhs.expand_terms());
                terms
            }
            Expr::Sub(lhs, rhs) => {
                let mut terms = lhs.expand_terms();
                terms.extend(rhs.expand_terms().into_iter().map(|t| t.scaled(-1.0)));
                terms
            }
            Expr::Mul(lhs, rhs) => multiply_sums(&lhs.expand_terms(), &rhs.expand_terms()),
            Expr::Div(lhs, rhs) => {
                let numerator = lhs.expand_terms();
                let denominator = collect(rhs.expand_terms());
                let inverse = match denominator.as_slice() {
                    // division by an exact zero stays visible as 0^-1
                    [] => Term::factor(Expr::Const(0.0), -1.0),
                    [single] => single.powf(-1.0).unwrap_or_else(|| {
                        Term::factor(single.to_expr(), -1.0)
                    }),
                    _ => Term::factor(terms_to_expr(&denominator), -1.0),
                };
                multiply_sums(&numerator, &[inverse])
            }
            Expr::Pow(base, exp) => {
                let exp = exp.collect_terms().simplify();
                match exp.as_const() {
                    Some(n) => expand_power(base, n),
                    None => {
                        let base = base.collect_terms().simplify();
                        if base == Expr::Const(E) {
                            vec![Term::factor(Expr::Exp(Box::new(exp)), 1.0)]
                        } else {
                            vec![Term::factor(Expr::Pow(Box::new(base), Box::new(exp)), 1.0)]
                        }
                    }
                }
            }
            Expr::Exp(arg) => unary_terms(arg, |x| x.exp(), Expr::Exp),
            Expr::Ln(arg) => {
                let arg = arg.collect_terms().simplify();
                match arg.as_const() {
                    Some(val) if val > 0.0 => constant_terms(val.ln()),
                    _ => vec![Term::factor(Expr::Ln(Box::new(arg)), 1.0)],
                }
            }
            Expr::sin(arg) => unary_terms(arg, |x| x.sin(), Expr::sin),
            Expr::cos(arg) => unary_terms(arg, |x| x.cos(), Expr::cos),
            Expr::tg(arg) => unary_terms(arg, |x| x.tan(), Expr::tg),
            Expr::Abs(arg) => unary_terms(arg, |x| x.abs(), Expr::Abs),
            Expr::Integral(inner, var, lower, upper) => {
                let inner = inner.collect_terms();
                if inner.contains_variable(var) {
                    vec![Term::factor(
                        Expr::Integral(Box::new(inner), var.clone(), *lower, *upper),
                        1.0,
                    )]
                } else {
                    multiply_sums(&inner.expand_terms(), &constant_terms(upper - lower))
                }
            }
        }
    }

    /// Expand, merge like terms and rebuild.
    pub fn collect_terms(&self) -> Expr {
        terms_to_expr(&collect(self.expand_terms()))
    }
}

/// `coeff * base1^p1 * base2^p2 * ...`
///
/// Bases are never constants except for the `0^-1` marker of a division by zero; factors are
/// kept sorted by their printed form so equal products compare equal.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub coeff: f64,
    pub factors: Vec<(Expr, f64)>,
}

impl Term {
    pub fn new(coeff: f64, factors: Vec<(Expr, f64)>) -> Term {
        Term { coeff, factors }.normalized()
    }

    pub fn factor(base: Expr, power: f64) -> Term {
        Term::new(1.0, vec![(base, power)])
    }

    pub fn scaled(&self, factor: f64) -> Term {
        Term {
            coeff: self.coeff * factor,
            factors: self.factors.clone(),
        }
    }

    pub fn mul(&self, other: &Term) -> Term {
        let mut factors = self.factors.clone();
        factors.extend(other.factors.iter().cloned());
        Term::new(self.coeff * other.coeff, factors)
    }

    /// `self ^ n` when it can be distributed over the factors: always for integer n, for
    /// other n only for a positive coefficient times at most one plain factor.
    pub fn powf(&self, n: f64) -> Option<Term> {
        if n.fract() == 0.0 {
            if self.coeff == 0.0 && n < 0.0 {
                return None;
            }
            let factors = self.factors.iter().map(|(b, p)| (b.clone(), p * n)).collect();
            return Some(Term::new(self.coeff.powi(n as i32), factors));
        }
        if self.coeff <= 0.0 {
            return None;
        }
        match self.factors.as_slice() {
            [] => Some(Term::new(self.coeff.powf(n), Vec::new())),
            [(base, p)] if *p == 1.0 => Some(Term::new(self.coeff.powf(n), vec![(base.clone(), n)])),
            _ => None,
        }
    }

    /// true if no factor is left
    pub fn is_constant(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn to_expr(&self) -> Expr {
        let product = self
            .factors
            .iter()
            .map(|(base, power)| {
                if *power == 1.0 {
                    base.clone()
                } else {
                    Expr::Pow(Box::new(base.clone()), Box::new(Expr::Const(*power)))
                }
            })
            .reduce(|acc, f| Expr::Mul(Box::new(acc), Box::new(f)));
        match product {
            None => Expr::Const(self.coeff),
            Some(product) if self.coeff == 1.0 => product,
            Some(product) => Expr::Mul(Box::new(Expr::Const(self.coeff)), Box::new(product)),
        }
    }

    /// merges equal bases, folds all exponentials into one and sorts the factors
    fn normalized(self) -> Term {
        let mut coeff = self.coeff;
        let mut merged: Vec<(Expr, f64)> = Vec::new();
        let mut exponent_args: Vec<Term> = Vec::new();
        let mut exp_count = 0;
        for (base, power) in self.factors {
            if power == 0.0 {
                continue;
            }
            if let Expr::Exp(arg) = &base {
                exp_count += 1;
                exponent_args.extend(arg.expand_terms().into_iter().map(|t| t.scaled(power)));
                continue;
            }
            match merged.iter_mut().find(|(b, _)| *b == base) {
                Some(slot) => slot.1 += power,
                None => merged.push((base, power)),
            }
        }
        if exp_count > 0 {
            let arg = collect(exponent_args);
            match arg.as_slice() {
                [] => {}
                [single] if single.is_constant() => coeff *= single.coeff.exp(),
                _ => merged.push((Expr::Exp(Box::new(terms_to_expr(&arg))), 1.0)),
            }
        }
        merged.retain(|(_, power)| *power != 0.0);
        merged.sort_by_cached_key(|(base, power)| format!("{}^{}", base, power));
        Term {
            coeff,
            factors: merged,
        }
    }
}

fn constant_terms(val: f64) -> Vec<Term> {
    if val == 0.0 {
        Vec::new()
    } else {
        vec![Term {
            coeff: val,
            factors: Vec::new(),
        }]
    }
}

fn unary_terms(arg: &Expr, apply: fn(f64) -> f64, build: fn(Box<Expr>) -> Expr) -> Vec<Term> {
    let arg = arg.collect_terms().simplify();
    match arg.as_const() {
        Some(val) if apply(val).is_finite() => constant_terms(apply(val)),
        _ => vec![Term::factor(build(Box::new(arg)), 1.0)],
    }
}

fn multiply_sums(lhs: &[Term], rhs: &[Term]) -> Vec<Term> {
    lhs.iter()
        .cartesian_product(rhs.iter())
        .map(|(a, b)| a.mul(b))
        .filter(|t| t.coeff != 0.0)
        .collect()
}

fn expand_power(base: &Expr, n: f64) -> Vec<Term> {
    if n == 0.0 {
        return constant_terms(1.0);
    }
    let terms = collect(base.expand_terms());
    match terms.as_slice() {
        [] if n > 0.0 => Vec::new(),
        [] => vec![Term::factor(Expr::Const(0.0), n)],
        [single] => match single.powf(n) {
            Some(term) => vec![term],
            None => vec![Term::factor(single.to_expr(), n)],
        },
        _ if n.fract() == 0.0 && n > 0.0 && n <= MAX_EXPANDED_POWER => {
            let mut product = terms.clone();
            for _ in 1..(n as usize) {
                product = collect(multiply_sums(&product, &terms));
            }
            product
        }
        _ => vec![Term::factor(terms_to_expr(&terms), n)],
    }
}

/// Merges terms with equal factor lists. A sum that cancels down to rounding noise of its
/// parts is dropped.
pub fn collect(terms: Vec<Term>) -> Vec<Term> {
    let mut out: Vec<(Term, f64)> = Vec::new();
    for term in terms {
        match out.iter_mut().find(|(t, _)| t.factors == term.factors) {
            Some((existing, magnitude)) => {
                existing.coeff += term.coeff;
                *magnitude = magnitude.max(term.coeff.abs());
            }
            None => {
                let magnitude = term.coeff.abs();
                out.push((term, magnitude));
            }
        }
    }
    out.into_iter()
        .filter(|(t, magnitude)| t.coeff != 0.0 && t.coeff.abs() > 1e-14 * magnitude)
        .map(|(t, _)| t)
        .collect()
}

/// Rebuilds a sum; negative coefficients after the first term become subtractions.
pub fn terms_to_expr(terms: &[Term]) -> Expr {
    let mut iter = terms.iter();
    let first = match iter.next() {
        Some(term) => term.to_expr(),
        None => return Expr::Const(0.0),
    };
    iter.fold(first, |acc, term| {
        if term.coeff < 0.0 {
            Expr::Sub(Box::new(acc), Box::new(term.scaled(-1.0).to_expr()))
        } else {
            Expr::Add(Box::new(acc), Box::new(term.to_expr()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input, &["r", "theta", "z"]).unwrap()
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(parse("2*3 + 4/2 - 1").simplify(), Expr::Const(7.0));
        assert_eq!(parse("2^10").simplify(), Expr::Const(1024.0));
        assert_eq!(parse("exp(0) + cos(0)").simplify(), Expr::Const(2.0));
    }

    #[test]
    fn test_identities() {
        assert_eq!(parse("r + 0").simplify(), var("r"));
        assert_eq!(parse("1 * z").simplify(), var("z"));
        assert_eq!(parse("0 * theta").simplify(), Expr::Const(0.0));
        assert_eq!(parse("r ^ 1").simplify(), var("r"));
        assert_eq!(parse("z ^ 0").simplify(), Expr::Const(1.0));
        assert_eq!(parse("0 / r").simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_singular_values_are_not_folded() {
        let ln_zero = parse("log(0)").simplify();
        assert_eq!(ln_zero, Expr::Ln(Box::new(Expr::Const(0.0))));
        assert!(ln_zero.is_singular());
        assert!(parse("1/0").simplify().is_singular());
        assert!(parse("(0-1)^0.5").simplify().is_singular());
        assert!(!parse("r*log(2)").simplify().is_singular());
    }

    #[test]
    fn test_zero_times_singular_is_zero() {
        // x*ln(x) at x = 0
        let expr = Expr::Const(0.0) * Expr::Ln(Box::new(Expr::Const(0.0)));
        assert_eq!(expr.simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_integral_without_its_variable_is_folded() {
        let integral = Expr::Integral(Box::new(var("r")), "z".to_string(), 1.0, 3.0);
        assert_eq!(integral.simplify(), Expr::Mul(Box::new(var("r")), Box::new(Expr::Const(2.0))));
    }

    #[test]
    fn test_collect_like_terms() {
        let collected = parse("3*r*z + 2*z*r").collect_terms();
        assert_eq!(collected, Expr::Const(5.0) * (var("r") * var("z")));
        assert_eq!(parse("r - r").collect_terms(), Expr::Const(0.0));
    }

    #[test]
    fn test_expand_products_and_powers() {
        let terms = collect(parse("(r + 1)^2").expand_terms());
        assert_eq!(terms.len(), 3);
        let value = terms_to_expr(&terms).set_variable("r", 3.0).simplify();
        assert_eq!(value, Expr::Const(16.0));

        let merged = parse("r * r^2 * sqrt(r) * sqrt(r)").collect_terms();
        assert_eq!(merged, Expr::Pow(Box::new(var("r")), Box::new(Expr::Const(4.0))));
    }

    #[test]
    fn test_exponentials_merge() {
        let merged = parse("exp(r) * exp(z)").collect_terms();
        let terms = merged.expand_terms();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].factors.len(), 1);
        assert!(matches!(terms[0].factors[0].0, Expr::Exp(_)));
        // exp(z)*exp(-z) = 1
        assert_eq!(parse("exp(z)*exp(-z)").collect_terms(), Expr::Const(1.0));
    }

    #[test]
    fn test_division_by_sum_is_kept_as_inverse_power() {
        let terms = parse("r/(r+1)").expand_terms();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].factors.len(), 2);
        let value = terms_to_expr(&terms).set_variable("r", 1.0).simplify();
        assert_relative_eq!(value.as_const().unwrap(), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_collect_drops_cancellation_noise() {
        let terms = vec![
            Term::new(0.1 + 0.2, vec![(var("r"), 1.0)]),
            Term::new(-0.3, vec![(var("r"), 1.0)]),
        ];
        assert!(collect(terms).is_empty());
    }
}
