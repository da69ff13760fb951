//! Triple integrals in cylindrical coordinates and the meshes to look at them.
//!
//! ```
//! use RustedCylindrical::cylindrical::api::CylindricalCalculator;
//! use std::f64::consts::PI;
//! let calculator = CylindricalCalculator::new();
//! let result = calculator.integrate_triple("r*z", 0.0, 1.0, 0.0, PI, 0.0, 2.0).unwrap();
//! assert!((result.value.unwrap() - 2.0 * PI / 3.0).abs() < 1e-10);
//! println!("{}", result.integrand_line());
//! let region = calculator.build_region_figure(0.0, 1.0, 0.0, PI, 0.0, 2.0);
//! assert_eq!(region.surfaces.len(), 5);
//! ```
/// public operations: evaluate, integrate_triple, build_region_figure, build_function_figure
pub mod api;
/// names of r, θ and z in expression text
pub mod binding;
pub mod bounds;
pub mod error;
/// surfaces, styles and colormap of a 3D figure
pub mod figure;
/// region and function meshers
pub mod mesh;
/// predefined examples
pub mod presets;
pub mod triple_integral;
