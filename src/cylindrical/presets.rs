use crate::cylindrical::bounds::IntegrationBounds;
use std::f64::consts::PI;

/// A named example: function text and bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub expression: &'static str,
    pub bounds: IntegrationBounds,
}

pub static PRESETS: [Preset; 4] = [
    Preset {
        name: "Simple cylinder",
        expression: "1",
        bounds: IntegrationBounds {
            r_min: 0.0,
            r_max: 2.0,
            theta_min: 0.0,
            theta_max: 2.0 * PI,
            z_min: 0.0,
            z_max: 3.0,
        },
    },
    Preset {
        name: "Linear function in z",
        expression: "r*z",
        bounds: IntegrationBounds {
            r_min: 0.0,
            r_max: 1.0,
            theta_min: 0.0,
            theta_max: PI,
            z_min: 0.0,
            z_max: 2.0,
        },
    },
    Preset {
        name: "Trigonometric function",
        expression: "r*cos(theta)",
        bounds: IntegrationBounds {
            r_min: 1.0,
            r_max: 2.0,
            theta_min: 0.0,
            theta_max: PI / 2.0,
            z_min: 0.0,
            z_max: 1.0,
        },
    },
    Preset {
        name: "Exponential function",
        expression: "r*exp(-z)",
        bounds: IntegrationBounds {
            r_min: 0.0,
            r_max: 1.0,
            theta_min: 0.0,
            theta_max: 2.0 * PI,
            z_min: 0.0,
            z_max: 1.0,
        },
    },
];

/// Case-insensitive lookup by name.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
