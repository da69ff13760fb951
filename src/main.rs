#![allow(non_snake_case)]
use RustedCylindrical::Utils::config::EngineConfig;
use RustedCylindrical::Utils::logger::{init_logger, save_surface_to_csv};
use RustedCylindrical::Utils::plots::render_figure_to_png;
use RustedCylindrical::Utils::report::{preset_rows, preset_table};
use RustedCylindrical::cylindrical::api::CylindricalCalculator;
use RustedCylindrical::cylindrical::figure::SurfaceRole;
use RustedCylindrical::cylindrical::presets::PRESETS;
use ndarray::{Array1, arr0};
use std::f64::consts::PI;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}, using defaults", path, e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };
    init_logger(config.level_filter(), false);
    let calculator = CylindricalCalculator::from_config(&config);

    let example = 0;
    match example {
        0 => {
            // all predefined examples in one table
            let rows = preset_rows(&calculator);
            println!("{}", preset_table(&rows));
        }
        1 => {
            // one integral, step by step
            let text = "r*cos(theta) + z**2";
            match calculator.integrate_triple(text, 0.0, 2.0, 0.0, PI / 2.0, 0.0, 1.0) {
                Ok(result) => {
                    println!("{}", result.latex());
                    println!("{}", result.integrand_line());
                    println!("after z:     {}", result.after_z);
                    println!("after theta: {}", result.after_theta);
                    println!("result:      {}", result.display_value());
                }
                Err(e) => println!("{}", e),
            }
            // no closed form: the unevaluated integral is computed by quadrature
            match calculator.integrate_triple("exp(z**2)", 0.0, 1.0, 0.0, 2.0 * PI, 0.0, 1.0) {
                Ok(result) => println!("{} = {}", result.result, result.display_value()),
                Err(e) => println!("{}", e),
            }
        }
        2 => {
            // vectorized evaluation along a ray
            let r = Array1::linspace(0.0, 2.0, 5).into_dyn();
            let values = calculator.evaluate(
                "r*exp(-z)",
                &r,
                &arr0(0.0).into_dyn(),
                &arr0(1.0).into_dyn(),
            );
            println!("{:?}", values);
        }
        3 => {
            // region and function figures of every preset
            for (i, preset) in PRESETS.iter().enumerate() {
                let b = &preset.bounds;
                let region = calculator.build_region_figure(
                    b.r_min,
                    b.r_max,
                    b.theta_min,
                    b.theta_max,
                    b.z_min,
                    b.z_max,
                );
                if let Err(e) = render_figure_to_png(&region, format!("region_{}.png", i), (1024, 768)) {
                    println!("{}", e);
                }
                match calculator.build_function_figure(
                    preset.expression,
                    b.r_min,
                    b.r_max,
                    b.theta_min,
                    b.theta_max,
                    b.default_height(),
                ) {
                    Ok(figure) => {
                        if let Err(e) =
                            render_figure_to_png(&figure, format!("function_{}.png", i), (1024, 768))
                        {
                            println!("{}", e);
                        }
                        if let Some(surface) = figure.surface(SurfaceRole::Function) {
                            if let Err(e) = save_surface_to_csv(surface, format!("function_{}.csv", i)) {
                                println!("{}", e);
                            }
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
        _ => println!("no such example"),
    }
}
