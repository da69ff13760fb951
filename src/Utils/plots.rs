use crate::cylindrical::figure::{Figure, Rgb, Surface};
use log::info;
use plotters::prelude::*;
use std::error::Error;
use std::ops::Range;
use std::path::Path;

/// one grid cell of a surface: four corners and the color of its mean height
pub struct Cell {
    pub corners: [(f64, f64, f64); 4],
    pub color: Rgb,
}

/// Splits a surface into quadrilateral cells, row by row.
pub fn surface_cells(surface: &Surface) -> Vec<Cell> {
    let (rows, cols) = surface.grid_shape();
    let mut cells = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1));
    for i in 1..rows {
        for j in 1..cols {
            let corner =
                |a: usize, b: usize| (surface.x[[a, b]], surface.y[[a, b]], surface.z[[a, b]]);
            let corners = [
                corner(i - 1, j - 1),
                corner(i - 1, j),
                corner(i, j),
                corner(i, j - 1),
            ];
            let mean_height = corners.iter().map(|c| c.2).sum::<f64>() / 4.0;
            cells.push(Cell {
                corners,
                color: surface.style.color_at(mean_height),
            });
        }
    }
    cells
}

/// axis range with a margin; a flat range still gets a visible width
fn padded(lo: f64, hi: f64) -> Range<f64> {
    let margin = if hi > lo { 0.05 * (hi - lo) } else { 0.5 };
    (lo - margin)..(hi + margin)
}

/// Draws every surface of the figure as translucent polygons into a PNG file.
pub fn render_figure_to_png<P: AsRef<Path>>(
    figure: &Figure,
    filename: P,
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let Some((x_range, y_range, z_range)) = figure.extent() else {
        return Err("figure has no samples to draw".into());
    };
    let path = filename.as_ref();
    let root_area = BitMapBackend::new(path, size).into_drawing_area();
    root_area.fill(&WHITE)?;

    // plotters draws its second axis upwards, so height goes there
    let mut chart = ChartBuilder::on(&root_area)
        .caption(&figure.title, ("sans-serif", 30))
        .margin(20)
        .build_cartesian_3d(
            padded(x_range.0, x_range.1),
            padded(z_range.0, z_range.1),
            padded(y_range.0, y_range.1),
        )?;
    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.4;
        pb.scale = 0.8;
        pb.into_matrix()
    });
    chart.configure_axes().draw()?;

    for surface in &figure.surfaces {
        let opacity = surface.style.opacity();
        chart.draw_series(surface_cells(surface).into_iter().map(|cell| {
            let Rgb(r, g, b) = cell.color;
            let points: Vec<(f64, f64, f64)> =
                cell.corners.iter().map(|&(x, y, z)| (x, z, y)).collect();
            Polygon::new(points, RGBColor(r, g, b).mix(opacity).filled())
        }))?;
    }
    root_area.present()?;
    info!("figure '{}' saved to {}", figure.title, path.display());
    Ok(())
}
