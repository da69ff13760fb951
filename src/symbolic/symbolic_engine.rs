//! # Symbolic Engine Module
//!
//! Core expression tree of the calculator. Every other symbolic module (parser, simplifier,
//! integrator, evaluators) works on the [`Expr`] enum defined here.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - free variables such as "r", "theta", "z"
//! - **Constants**: `Const(f64)` - numerical constants (pi and e are stored by value)
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `Abs`
//! - **Unevaluated integral**: `Integral(f, var, a, b)` - a definite integral that has no closed
//!   form in the rule table. It binds `var`, so `var` is not free in the node.
//!
//! ### Key Methods
//! - `set_variable(var, value)` - substitute a number for a free variable
//! - `substitute_variable(var, expr)` - substitute an expression for a free variable
//! - `contains_variable(var)` - is `var` free in the expression
//! - `extract_variables()` - sorted list of free variables
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Expression Tree**: Box<Expr> children, immutable once built
//! 2. **Operator Overloading**: std::ops traits give `x * y + Expr::Const(2.0)` syntax
//! 3. **Non-standard Function Names**: `tg` for tangent, as in mathematical notation

#![allow(non_camel_case_types)]

use std::f64;
use std::fmt;

/// Symbolic expression as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use symbolic_engine::Expr;
/// let r = Expr::Var("r".to_string());
/// let expr = Expr::Mul(Box::new(r.clone()), Box::new(r));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function
    sin(Box<Expr>),
    /// Cosine function
    cos(Box<Expr>),
    /// Tangent function, mathematical notation 'tg'
    tg(Box<Expr>),
    /// Absolute value
    Abs(Box<Expr>),
    /// Unevaluated definite integral of the expression over `var` from lower to upper
    Integral(Box<Expr>, String, f64, f64),
}

/// Fully parenthesized printing, the same shape the parser accepts back.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tg({})", expr),
            Expr::Abs(expr) => write!(f, "abs({})", expr),
            Expr::Integral(expr, var, lower, upper) => {
                write!(f, "Integral({}, ({}, {}, {}))", expr, var, lower, upper)
            }
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Substitutes a variable with a constant value throughout the expression.
    ///
    /// Occurrences bound by an `Integral` over the same variable are left alone.
    ///
    /// # Arguments
    /// * `var` - Name of the variable to substitute
    /// * `value` - Numerical value to substitute for the variable
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::Const(value))
    }

    /// Replaces a free variable with another expression.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.substitute_variable(var, expr)),
                Box::new(exp.substitute_variable(var, expr)),
            ),
            Expr::Exp(arg) => Expr::Exp(Box::new(arg.substitute_variable(var, expr))),
            Expr::Ln(arg) => Expr::Ln(Box::new(arg.substitute_variable(var, expr))),
            Expr::sin(arg) => Expr::sin(Box::new(arg.substitute_variable(var, expr))),
            Expr::cos(arg) => Expr::cos(Box::new(arg.substitute_variable(var, expr))),
            Expr::tg(arg) => Expr::tg(Box::new(arg.substitute_variable(var, expr))),
            Expr::Abs(arg) => Expr::Abs(Box::new(arg.substitute_variable(var, expr))),
            Expr::Integral(inner, bound, lower, upper) => {
                if bound == var {
                    self.clone()
                } else {
                    Expr::Integral(
                        Box::new(inner.substitute_variable(var, expr)),
                        bound.clone(),
                        *lower,
                        *upper,
                    )
                }
            }
        }
    }

    /// true if `var_name` occurs free in the expression
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            Expr::Pow(base, exp) => {
                base.contains_variable(var_name) || exp.contains_variable(var_name)
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tg(expr)
            | Expr::Abs(expr) => expr.contains_variable(var_name),
            Expr::Integral(expr, bound, _, _) => {
                bound != var_name && expr.contains_variable(var_name)
            }
        }
    }

    /// Sorted, deduplicated names of the free variables.
    pub fn extract_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Expr::Var(name) => vars.push(name.clone()),
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tg(expr)
            | Expr::Abs(expr) => expr.collect_variables(vars),
            Expr::Integral(expr, bound, _, _) => {
                let mut inner = Vec::new();
                expr.collect_variables(&mut inner);
                vars.extend(inner.into_iter().filter(|name| name != bound));
            }
        }
    }

    /// true if the tree holds an unevaluated integral anywhere
    pub fn has_unevaluated_integral(&self) -> bool {
        match self {
            Expr::Var(_) | Expr::Const(_) => false,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.has_unevaluated_integral() || rhs.has_unevaluated_integral()
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tg(expr)
            | Expr::Abs(expr) => expr.has_unevaluated_integral(),
            Expr::Integral(_, _, _, _) => true,
        }
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// numeric value if the node is a constant
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            _ => None,
        }
    }
}
