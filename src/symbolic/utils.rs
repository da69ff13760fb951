use ndarray::Array2;

// evenly spaced values over the closed interval [start, end]
pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    if num_values == 1 {
        return vec![start];
    }
    let mut values = Vec::with_capacity(num_values);
    let step = (end - start) / (num_values as f64 - 1.0);

    for i in 0..num_values {
        let value = start + (i as f64 * step);
        values.push(value);
    }
    // land exactly on the end point
    if let Some(last) = values.last_mut() {
        *last = end;
    }
    values
}

/// Coordinate matrices from two coordinate vectors, `xy` indexing: both outputs have shape
/// `(y.len(), x.len())`, the first varies along columns and the second along rows.
pub fn meshgrid(x: &[f64], y: &[f64]) -> (Array2<f64>, Array2<f64>) {
    let shape = (y.len(), x.len());
    let xx = Array2::from_shape_fn(shape, |(_, j)| x[j]);
    let yy = Array2::from_shape_fn(shape, |(i, _)| y[i]);
    (xx, yy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace() {
        let values = linspace(0.0, 1.0, 5);
        assert_eq!(values.len(), 5);
        assert_relative_eq!(values[1], 0.25);
        assert_eq!(values[4], 1.0);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_linspace_hits_end_exactly() {
        let values = linspace(0.0, 2.0 * std::f64::consts::PI, 50);
        assert_eq!(values[49], 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn test_meshgrid() {
        let (xx, yy) = meshgrid(&[1.0, 2.0, 3.0], &[10.0, 20.0]);
        assert_eq!(xx.shape(), &[2, 3]);
        assert_eq!(yy.shape(), &[2, 3]);
        assert_eq!(xx[[1, 2]], 3.0);
        assert_eq!(yy[[1, 2]], 20.0);
        assert_eq!(xx[[0, 0]], 1.0);
        assert_eq!(yy[[0, 0]], 10.0);
    }
}
