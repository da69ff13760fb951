#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression over a given set of variables
///
///# Example
/// ```
/// use RustedCylindrical::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("r*cos(theta) + z**2", &["r", "theta", "z"]).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// assert!(Expr::parse_expression("r*w", &["r", "theta", "z"]).is_err());
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// the expression tree: variables, constants, arithmetic, elementary functions and unevaluated
/// definite integrals, with substitution and variable queries
///# Example#
/// ```
/// use RustedCylindrical::symbolic::symbolic_engine::Expr;
/// let expr = Expr::Var("r".to_string()) * Expr::Var("z".to_string());
/// assert_eq!(expr.extract_variables(), vec!["r".to_string(), "z".to_string()]);
/// let at_z = expr.set_variable("z", 2.0);
/// println!("{}", at_z);
/// ```
pub mod symbolic_engine;
/// algebraic simplification, expansion into sums of power products and collection of like terms
pub mod symbolic_simplify;
/// definite and indefinite integration with a rule table and integration by parts
///# Example#
/// ```
/// use RustedCylindrical::symbolic::symbolic_engine::Expr;
/// let expr = Expr::parse_expression("r*z", &["r", "theta", "z"]).unwrap();
/// let over_z = expr.definite_integral("z", 0.0, 2.0).unwrap();
/// let value = over_z.eval_numeric(&["r"], &[3.0]).unwrap();
/// assert!((value - 6.0).abs() < 1e-12);
/// ```
pub mod symbolic_integration;
/// scalar numeric evaluation, Gauss-Legendre quadrature of unevaluated integrals
pub mod symbolic_lambdify;
/// vectorized evaluation over broadcastable ndarray inputs
pub mod symbolic_vectorized;
/// linspace and meshgrid
pub mod utils;
