//! Renderer-independent description of a 3D figure: a list of parametric surfaces, each a
//! triple of equally shaped x/y/z grids plus a style. Drawing is left to `Utils::plots` or
//! any other backend.

use ndarray::Array2;

/// Which boundary (or function) a surface represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    InnerWall,
    OuterWall,
    AngularStart,
    AngularEnd,
    BottomCap,
    TopCap,
    Function,
}

impl SurfaceRole {
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceRole::InnerWall => "Inner surface (r_min)",
            SurfaceRole::OuterWall => "Outer surface (r_max)",
            SurfaceRole::AngularStart => "Surface θ_min",
            SurfaceRole::AngularEnd => "Surface θ_max",
            SurfaceRole::BottomCap => "Bottom surface (z_min)",
            SurfaceRole::TopCap => "Top surface (z_max)",
            SurfaceRole::Function => "f(r, θ, z)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
}

/// Value range shown next to a value-mapped surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub title: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceStyle {
    /// one color for the whole surface
    Solid { color: Rgb, opacity: f64 },
    /// viridis color of the height, scaled to the color bar range
    ValueMapped { opacity: f64, color_bar: ColorBar },
}

impl SurfaceStyle {
    pub fn opacity(&self) -> f64 {
        match self {
            SurfaceStyle::Solid { opacity, .. } => *opacity,
            SurfaceStyle::ValueMapped { opacity, .. } => *opacity,
        }
    }

    /// Color of one sample with height `value`.
    pub fn color_at(&self, value: f64) -> Rgb {
        match self {
            SurfaceStyle::Solid { color, .. } => *color,
            SurfaceStyle::ValueMapped { color_bar, .. } => {
                let span = color_bar.max - color_bar.min;
                let t = if span > 0.0 {
                    (value - color_bar.min) / span
                } else {
                    0.5
                };
                viridis(t)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub role: SurfaceRole,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
    pub style: SurfaceStyle,
}

impl Surface {
    /// (rows, columns) of the sample grid
    pub fn grid_shape(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn name(&self) -> &'static str {
        self.role.label()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub surfaces: Vec<Surface>,
}

impl Figure {
    pub fn new(title: &str) -> Self {
        Figure {
            title: title.to_string(),
            surfaces: Vec::new(),
        }
    }

    pub fn push(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    pub fn surface(&self, role: SurfaceRole) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.role == role)
    }

    /// Smallest box containing every sample: ((x_min, x_max), (y_min, y_max), (z_min, z_max)).
    pub fn extent(&self) -> Option<((f64, f64), (f64, f64), (f64, f64))> {
        if self.surfaces.iter().all(|s| s.x.is_empty()) {
            return None;
        }
        let surfaces = &self.surfaces;
        Some((
            span(surfaces.iter().flat_map(|s| s.x.iter())),
            span(surfaces.iter().flat_map(|s| s.y.iter())),
            span(surfaces.iter().flat_map(|s| s.z.iter())),
        ))
    }
}

fn span<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

// matplotlib viridis sampled at t = 0, 0.25, 0.5, 0.75, 1
const VIRIDIS: [(f64, f64, f64); 5] = [
    (68.0, 1.0, 84.0),
    (59.0, 82.0, 139.0),
    (33.0, 145.0, 140.0),
    (94.0, 201.0, 98.0),
    (253.0, 231.0, 37.0),
];

/// Viridis colormap, `t` clamped to [0, 1].
pub fn viridis(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let w = scaled - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |p: f64, q: f64| (p + (q - p) * w).round() as u8;
    Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_viridis_end_points() {
        assert_eq!(viridis(0.0), Rgb(68, 1, 84));
        assert_eq!(viridis(1.0), Rgb(253, 231, 37));
        assert_eq!(viridis(0.5), Rgb(33, 145, 140));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(f64::NAN), viridis(0.0));
    }

    #[test]
    fn test_color_at() {
        let style = SurfaceStyle::ValueMapped {
            opacity: 0.8,
            color_bar: ColorBar {
                title: "f".to_string(),
                min: 0.0,
                max: 2.0,
            },
        };
        assert_eq!(style.color_at(2.0), viridis(1.0));
        assert_eq!(style.opacity(), 0.8);
        let solid = SurfaceStyle::Solid {
            color: Rgb::RED,
            opacity: 0.3,
        };
        assert_eq!(solid.color_at(100.0), Rgb::RED);
    }

    #[test]
    fn test_extent() {
        let mut figure = Figure::new("test");
        assert_eq!(figure.extent(), None);
        figure.push(Surface {
            role: SurfaceRole::TopCap,
            x: arr2(&[[0.0, 1.0]]),
            y: arr2(&[[-2.0, 2.0]]),
            z: arr2(&[[3.0, 3.0]]),
            style: SurfaceStyle::Solid {
                color: Rgb::YELLOW,
                opacity: 0.3,
            },
        });
        assert_eq!(figure.extent(), Some(((0.0, 1.0), (-2.0, 2.0), (3.0, 3.0))));
        assert!(figure.surface(SurfaceRole::TopCap).is_some());
        assert!(figure.surface(SurfaceRole::InnerWall).is_none());
    }
}
