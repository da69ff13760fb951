//! Cylindrical-to-Cartesian sample grids for the region boundary and the function surface.

use crate::cylindrical::binding::VariableBinding;
use crate::cylindrical::bounds::IntegrationBounds;
use crate::cylindrical::error::CalcError;
use crate::cylindrical::figure::{ColorBar, Figure, Rgb, Surface, SurfaceRole, SurfaceStyle};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::EvaluationError;
use crate::symbolic::utils::{linspace, meshgrid};
use log::debug;
use ndarray::{Array2, Ix2, arr0};

/// boundary surfaces are drawn with this opacity
pub const REGION_OPACITY: f64 = 0.3;
pub const FUNCTION_OPACITY: f64 = 0.8;

/// Samples per axis of the region boundary surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshResolution {
    pub theta_steps: usize,
    pub r_steps: usize,
    pub z_steps: usize,
}

impl Default for MeshResolution {
    fn default() -> Self {
        MeshResolution {
            theta_steps: 50,
            r_steps: 30,
            z_steps: 30,
        }
    }
}

/// Samples per axis of the function surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceResolution {
    pub r_steps: usize,
    pub theta_steps: usize,
}

impl Default for SurfaceResolution {
    fn default() -> Self {
        SurfaceResolution {
            r_steps: 30,
            theta_steps: 30,
        }
    }
}

fn solid(color: Rgb) -> SurfaceStyle {
    SurfaceStyle::Solid {
        color,
        opacity: REGION_OPACITY,
    }
}

/// x = r cos θ, y = r sin θ for equally shaped grids
fn to_cartesian(r: &Array2<f64>, theta: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let x = r * &theta.mapv(f64::cos);
    let y = r * &theta.mapv(f64::sin);
    (x, y)
}

/// Wall r = radius, grid (z_steps × theta_steps).
fn wall(role: SurfaceRole, radius: f64, theta: &[f64], z: &[f64], color: Rgb) -> Surface {
    let (theta_grid, z_grid) = meshgrid(theta, z);
    let r_grid = Array2::from_elem(theta_grid.dim(), radius);
    let (x, y) = to_cartesian(&r_grid, &theta_grid);
    Surface {
        role,
        x,
        y,
        z: z_grid,
        style: solid(color),
    }
}

/// Half-plane θ = angle, grid (z_steps × r_steps).
fn half_plane(role: SurfaceRole, angle: f64, r: &[f64], z: &[f64]) -> Surface {
    let (r_grid, z_grid) = meshgrid(r, z);
    let theta_grid = Array2::from_elem(r_grid.dim(), angle);
    let (x, y) = to_cartesian(&r_grid, &theta_grid);
    Surface {
        role,
        x,
        y,
        z: z_grid,
        style: solid(Rgb::GREEN),
    }
}

/// Cap z = height, grid (theta_steps × r_steps).
fn cap(role: SurfaceRole, height: f64, r: &[f64], theta: &[f64]) -> Surface {
    let (r_grid, theta_grid) = meshgrid(r, theta);
    let (x, y) = to_cartesian(&r_grid, &theta_grid);
    let z = Array2::from_elem(r_grid.dim(), height);
    Surface {
        role,
        x,
        y,
        z,
        style: solid(Rgb::YELLOW),
    }
}

/// The boundary of the cylindrical box as six surfaces (five when r_min is not positive:
/// the inner wall degenerates to the axis).
pub fn region_figure(bounds: &IntegrationBounds, resolution: &MeshResolution) -> Figure {
    let theta = linspace(bounds.theta_min, bounds.theta_max, resolution.theta_steps);
    let r = linspace(bounds.r_min, bounds.r_max, resolution.r_steps);
    let z = linspace(bounds.z_min, bounds.z_max, resolution.z_steps);

    let mut figure = Figure::new("Region of Integration");
    if bounds.r_min > 0.0 {
        figure.push(wall(SurfaceRole::InnerWall, bounds.r_min, &theta, &z, Rgb::BLUE));
    }
    figure.push(wall(SurfaceRole::OuterWall, bounds.r_max, &theta, &z, Rgb::RED));
    figure.push(half_plane(SurfaceRole::AngularStart, bounds.theta_min, &r, &z));
    figure.push(half_plane(SurfaceRole::AngularEnd, bounds.theta_max, &r, &z));
    figure.push(cap(SurfaceRole::BottomCap, bounds.z_min, &r, &theta));
    figure.push(cap(SurfaceRole::TopCap, bounds.z_max, &r, &theta));
    debug!("region figure with {} surfaces", figure.surfaces.len());
    figure
}

/// Height map of `expr` over the (r, θ) rectangle at fixed z, grid (theta_steps × r_steps),
/// colored by value.
#[allow(clippy::too_many_arguments)]
pub fn function_figure(
    expr: &Expr,
    r_min: f64,
    r_max: f64,
    theta_min: f64,
    theta_max: f64,
    z_fixed: f64,
    binding: &VariableBinding,
    resolution: &SurfaceResolution,
    quadrature_degree: usize,
) -> Result<Figure, CalcError> {
    let r = linspace(r_min, r_max, resolution.r_steps);
    let theta = linspace(theta_min, theta_max, resolution.theta_steps);
    let (r_grid, theta_grid) = meshgrid(&r, &theta);
    let (x, y) = to_cartesian(&r_grid, &theta_grid);

    let values = expr
        .eval_vectorized_with_degree(
            &binding.names(),
            &[
                r_grid.clone().into_dyn(),
                theta_grid.into_dyn(),
                arr0(z_fixed).into_dyn(),
            ],
            quadrature_degree,
        )?
        .into_dimensionality::<Ix2>()
        .map_err(|_| EvaluationError::ShapeMismatch {
            left: vec![r_grid.nrows(), r_grid.ncols()],
            right: vec![],
        })?;

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let mut figure = Figure::new(&format!("f(r, θ, z={:.2})", z_fixed));
    figure.push(Surface {
        role: SurfaceRole::Function,
        x,
        y,
        z: values,
        style: SurfaceStyle::ValueMapped {
            opacity: FUNCTION_OPACITY,
            color_bar: ColorBar {
                title: "f(r,θ,z)".to_string(),
                min,
                max,
            },
        },
    });
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_surfaces_lie_on_their_boundaries() {
        let bounds = IntegrationBounds::new(1.0, 2.0, 0.0, PI / 2.0, -1.0, 1.0);
        let figure = region_figure(&bounds, &MeshResolution::default());
        assert_eq!(figure.surfaces.len(), 6);

        let outer = figure.surface(SurfaceRole::OuterWall).unwrap();
        for (x, y) in outer.x.iter().zip(outer.y.iter()) {
            assert_relative_eq!(x.hypot(*y), 2.0, epsilon = 1e-12);
        }
        let end = figure.surface(SurfaceRole::AngularEnd).unwrap();
        for (x, y) in end.x.iter().zip(end.y.iter()) {
            assert_relative_eq!(*x, 0.0, epsilon = 1e-12);
            assert!(*y >= 1.0 - 1e-12);
        }
        let bottom = figure.surface(SurfaceRole::BottomCap).unwrap();
        assert!(bottom.z.iter().all(|z| *z == -1.0));
    }

    #[test]
    fn test_inner_wall_only_for_positive_r_min() {
        let bounds = IntegrationBounds::new(0.0, 2.0, 0.0, 2.0 * PI, 0.0, 3.0);
        let figure = region_figure(&bounds, &MeshResolution::default());
        assert_eq!(figure.surfaces.len(), 5);
        assert!(figure.surface(SurfaceRole::InnerWall).is_none());
    }

    #[test]
    fn test_function_surface() {
        let expr = Expr::parse_expression("r*z", &VariableBinding::CYLINDRICAL.names()).unwrap();
        let figure = function_figure(
            &expr,
            0.0,
            1.0,
            0.0,
            PI,
            2.0,
            &VariableBinding::CYLINDRICAL,
            &SurfaceResolution::default(),
            32,
        )
        .unwrap();
        let surface = figure.surface(SurfaceRole::Function).unwrap();
        assert_eq!(surface.grid_shape(), (30, 30));
        assert_relative_eq!(surface.z[[0, 29]], 2.0);
        match &surface.style {
            SurfaceStyle::ValueMapped { color_bar, .. } => {
                assert_relative_eq!(color_bar.min, 0.0);
                assert_relative_eq!(color_bar.max, 2.0);
            }
            other => panic!("unexpected style {:?}", other),
        }
    }

    #[test]
    fn test_function_surface_evaluation_error() {
        let expr = Expr::parse_expression("1/r", &VariableBinding::CYLINDRICAL.names()).unwrap();
        let result = function_figure(
            &expr,
            0.0,
            1.0,
            0.0,
            PI,
            0.0,
            &VariableBinding::CYLINDRICAL,
            &SurfaceResolution::default(),
            32,
        );
        assert_eq!(
            result,
            Err(CalcError::Evaluation(EvaluationError::DivisionByZero))
        );
    }
}
