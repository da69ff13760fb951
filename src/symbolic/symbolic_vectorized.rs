//! Whole-array evaluation of expressions over ndarray inputs.
//!
//! Every node of the tree is evaluated once for the whole array (one `Zip` or `mapv` pass per
//! node) instead of walking the tree once per sample. Inputs follow numpy broadcasting rules:
//! shapes are aligned from the trailing axis and an axis of length 1 stretches to match.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::{
    DEFAULT_QUADRATURE_DEGREE, EvaluationError, logarithm, power,
};
use ndarray::{ArrayD, ArrayViewD, Dimension, IxDyn, Zip};

/// Common shape of two broadcastable shapes.
pub fn broadcast_shape(left: &[usize], right: &[usize]) -> Result<Vec<usize>, EvaluationError> {
    let ndim = left.len().max(right.len());
    let mut shape = Vec::with_capacity(ndim);
    for axis in 0..ndim {
        let l = axis_len(left, axis, ndim);
        let r = axis_len(right, axis, ndim);
        let len = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            return Err(EvaluationError::ShapeMismatch {
                left: left.to_vec(),
                right: right.to_vec(),
            });
        };
        shape.push(len);
    }
    Ok(shape)
}

fn axis_len(shape: &[usize], axis: usize, ndim: usize) -> usize {
    let offset = ndim - shape.len();
    if axis >= offset { shape[axis - offset] } else { 1 }
}

fn broadcast_to<'a>(
    array: &'a ArrayD<f64>,
    shape: &[usize],
) -> Result<ArrayViewD<'a, f64>, EvaluationError> {
    array
        .broadcast(IxDyn(shape))
        .ok_or_else(|| EvaluationError::ShapeMismatch {
            left: array.shape().to_vec(),
            right: shape.to_vec(),
        })
}

/// Views of both operands stretched to their common shape.
fn broadcast_pair<'a>(
    lhs: &'a ArrayD<f64>,
    rhs: &'a ArrayD<f64>,
) -> Result<(ArrayViewD<'a, f64>, ArrayViewD<'a, f64>), EvaluationError> {
    let shape = broadcast_shape(lhs.shape(), rhs.shape())?;
    Ok((broadcast_to(lhs, &shape)?, broadcast_to(rhs, &shape)?))
}

fn zip_with(
    lhs: &ArrayD<f64>,
    rhs: &ArrayD<f64>,
    op: impl Fn(f64, f64) -> f64,
) -> Result<ArrayD<f64>, EvaluationError> {
    let (a, b) = broadcast_pair(lhs, rhs)?;
    Ok(Zip::from(&a).and(&b).map_collect(|&x, &y| op(x, y)))
}

/// bound inputs of one evaluation
struct ArrayEnv<'a> {
    names: &'a [&'a str],
    arrays: &'a [ArrayD<f64>],
    shape: Vec<usize>,
    degree: usize,
}

impl Expr {
    /// Evaluates the expression for every sample of the broadcast inputs.
    ///
    /// `vars[i]` is bound to `arrays[i]`; 0-dimensional arrays act as scalars. The result has
    /// the common broadcast shape of all inputs.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let r = ndarray::arr1(&[1.0, 2.0]).into_dyn();
    /// let z = ndarray::arr0(3.0).into_dyn();
    /// let values = expr.eval_vectorized(&["r", "z"], &[r, z])?;
    /// ```
    pub fn eval_vectorized(
        &self,
        vars: &[&str],
        arrays: &[ArrayD<f64>],
    ) -> Result<ArrayD<f64>, EvaluationError> {
        self.eval_vectorized_with_degree(vars, arrays, DEFAULT_QUADRATURE_DEGREE)
    }

    pub fn eval_vectorized_with_degree(
        &self,
        vars: &[&str],
        arrays: &[ArrayD<f64>],
        degree: usize,
    ) -> Result<ArrayD<f64>, EvaluationError> {
        let mut shape: Vec<usize> = Vec::new();
        for array in arrays {
            shape = broadcast_shape(&shape, array.shape())?;
        }
        let env = ArrayEnv {
            names: vars,
            arrays,
            shape,
            degree,
        };
        let result = self.eval_array(&env)?;
        if result.iter().any(|v| !v.is_finite()) {
            return Err(EvaluationError::NonFinite);
        }
        Ok(broadcast_to(&result, &env.shape)?.to_owned())
    }

    fn eval_array(&self, env: &ArrayEnv) -> Result<ArrayD<f64>, EvaluationError> {
        match self {
            Expr::Var(name) => env
                .names
                .iter()
                .rposition(|v| v == name)
                .and_then(|i| env.arrays.get(i))
                .cloned()
                .ok_or_else(|| EvaluationError::UnboundVariable(name.clone())),
            Expr::Const(val) => Ok(ArrayD::from_elem(IxDyn(&[]), *val)),
            Expr::Add(lhs, rhs) => zip_with(&lhs.eval_array(env)?, &rhs.eval_array(env)?, |a, b| a + b),
            Expr::Sub(lhs, rhs) => zip_with(&lhs.eval_array(env)?, &rhs.eval_array(env)?, |a, b| a - b),
            Expr::Mul(lhs, rhs) => zip_with(&lhs.eval_array(env)?, &rhs.eval_array(env)?, |a, b| a * b),
            Expr::Div(lhs, rhs) => {
                let numerator = lhs.eval_array(env)?;
                let denominator = rhs.eval_array(env)?;
                if denominator.iter().any(|v| *v == 0.0) {
                    return Err(EvaluationError::DivisionByZero);
                }
                zip_with(&numerator, &denominator, |a, b| a / b)
            }
            Expr::Pow(base, exp) => {
                let base = base.eval_array(env)?;
                let exp = exp.eval_array(env)?;
                let (a, b) = broadcast_pair(&base, &exp)?;
                // domain checks first, then one vectorized pass
                for (&x, &y) in a.iter().zip(b.iter()) {
                    power(x, y)?;
                }
                Ok(Zip::from(&a).and(&b).map_collect(|&x, &y| x.powf(y)))
            }
            Expr::Exp(arg) => Ok(arg.eval_array(env)?.mapv(f64::exp)),
            Expr::Ln(arg) => {
                let values = arg.eval_array(env)?;
                values.iter().try_for_each(|&x| logarithm(x).map(|_| ()))?;
                Ok(values.mapv(f64::ln))
            }
            Expr::sin(arg) => Ok(arg.eval_array(env)?.mapv(f64::sin)),
            Expr::cos(arg) => Ok(arg.eval_array(env)?.mapv(f64::cos)),
            Expr::tg(arg) => Ok(arg.eval_array(env)?.mapv(f64::tan)),
            Expr::Abs(arg) => Ok(arg.eval_array(env)?.mapv(f64::abs)),
            Expr::Integral(_, _, _, _) => self.eval_pointwise(env),
        }
    }

    /// Point-by-point fallback for unevaluated integrals, which need quadrature per sample.
    fn eval_pointwise(&self, env: &ArrayEnv) -> Result<ArrayD<f64>, EvaluationError> {
        let views = env
            .arrays
            .iter()
            .map(|array| broadcast_to(array, &env.shape))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = ArrayD::<f64>::zeros(IxDyn(&env.shape));
        for (index, slot) in out.indexed_iter_mut() {
            let point: Vec<f64> = views.iter().map(|view| view[index.slice()]).collect();
            *slot = self.eval_point(env.names, &point, env.degree)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::utils::meshgrid;
    use approx::assert_relative_eq;
    use ndarray::{arr0, arr1, arr2};

    const VARS: [&str; 3] = ["r", "theta", "z"];

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input, &VARS).unwrap()
    }

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[3, 1], &[4]).unwrap(), vec![3, 4]);
        assert_eq!(broadcast_shape(&[], &[5]).unwrap(), vec![5]);
        assert_eq!(broadcast_shape(&[2, 3], &[2, 3]).unwrap(), vec![2, 3]);
        assert!(broadcast_shape(&[3], &[4]).is_err());
    }

    #[test]
    fn test_scalars() {
        let value = parse("r*z + theta")
            .eval_vectorized(
                &VARS,
                &[arr0(2.0).into_dyn(), arr0(1.0).into_dyn(), arr0(3.0).into_dyn()],
            )
            .unwrap();
        assert_eq!(value.shape(), &[] as &[usize]);
        assert_relative_eq!(value[IxDyn(&[])], 7.0);
    }

    #[test]
    fn test_grid_with_scalar_height() {
        let (r, theta) = meshgrid(&[1.0, 2.0, 3.0], &[0.0, 1.0]);
        let value = parse("r*cos(theta)*z")
            .eval_vectorized(
                &VARS,
                &[r.clone().into_dyn(), theta.clone().into_dyn(), arr0(2.0).into_dyn()],
            )
            .unwrap();
        assert_eq!(value.shape(), &[2, 3]);
        for i in 0..2 {
            for j in 0..3 {
                let expected = r[[i, j]] * theta[[i, j]].cos() * 2.0;
                assert_relative_eq!(value[[i, j]], expected, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_constant_expression_takes_the_broadcast_shape() {
        let r = arr1(&[1.0, 2.0, 3.0, 4.0]).into_dyn();
        let value = parse("1")
            .eval_vectorized(&VARS, &[r, arr0(0.0).into_dyn(), arr0(0.0).into_dyn()])
            .unwrap();
        assert_eq!(value.shape(), &[4]);
        assert!(value.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_row_and_column_broadcast() {
        let r = arr2(&[[1.0], [2.0]]).into_dyn();
        let theta = arr1(&[0.0, 0.5, 1.0]).into_dyn();
        let value = parse("r + theta")
            .eval_vectorized(&VARS, &[r, theta, arr0(0.0).into_dyn()])
            .unwrap();
        assert_eq!(value.shape(), &[2, 3]);
        assert_relative_eq!(value[[1, 2]], 3.0);
    }

    #[test]
    fn test_errors() {
        let zero = arr0(0.0).into_dyn();
        let r = arr1(&[1.0, 0.0]).into_dyn();
        assert_eq!(
            parse("1/r").eval_vectorized(&VARS, &[r.clone(), zero.clone(), zero.clone()]),
            Err(EvaluationError::DivisionByZero)
        );
        assert!(matches!(
            parse("log(r - 1)").eval_vectorized(&VARS, &[r.clone(), zero.clone(), zero.clone()]),
            Err(EvaluationError::Domain { .. })
        ));
        let bad = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        assert!(matches!(
            parse("r + theta").eval_vectorized(&VARS, &[r, bad, zero]),
            Err(EvaluationError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_integral_node_is_evaluated_per_sample() {
        let inner = parse("r*z");
        let integral = Expr::Integral(Box::new(inner), "z".to_string(), 0.0, 2.0);
        let r = arr1(&[1.0, 3.0]).into_dyn();
        let zero = arr0(0.0).into_dyn();
        let value = integral.eval_vectorized(&VARS, &[r, zero.clone(), zero]).unwrap();
        assert_relative_eq!(value[[0]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(value[[1]], 6.0, epsilon = 1e-12);
    }
}
