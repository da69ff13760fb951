/*
Pretty printing of the predefined examples and their integrals as a console table.
*/
use crate::cylindrical::api::CylindricalCalculator;
use crate::cylindrical::bounds::IntegrationBounds;
use crate::cylindrical::presets::PRESETS;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct PresetRow {
    #[tabled(rename = "Example")]
    pub name: String,
    #[tabled(rename = "f(r, θ, z)")]
    pub function: String,
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Volume")]
    pub volume: String,
    #[tabled(rename = "∭ f r dz dθ dr")]
    pub result: String,
}

fn describe_region(bounds: &IntegrationBounds) -> String {
    let (theta_min, theta_max) = bounds.theta_degrees();
    format!(
        "r∈[{}, {}], θ∈[{:.1}°, {:.1}°], z∈[{}, {}]",
        bounds.r_min, bounds.r_max, theta_min, theta_max, bounds.z_min, bounds.z_max
    )
}

/// Integrates every preset. A failed integral is reported in its row.
pub fn preset_rows(calculator: &CylindricalCalculator) -> Vec<PresetRow> {
    PRESETS
        .iter()
        .map(|preset| {
            let result = match calculator.integrate_bounds(preset.expression, &preset.bounds) {
                Ok(result) => result.display_value(),
                Err(e) => format!("error: {}", e),
            };
            PresetRow {
                name: preset.name.to_string(),
                function: preset.expression.to_string(),
                region: describe_region(&preset.bounds),
                volume: format!("{:.4}", preset.bounds.region_volume()),
                result,
            }
        })
        .collect()
}

pub fn preset_table(rows: &[PresetRow]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern_rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_rows() {
        let rows = preset_rows(&CylindricalCalculator::new());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].result, "37.699112");
        assert_eq!(rows[1].result, "2.094395");
        assert_eq!(rows[2].result, "2.333333");
        assert_eq!(rows[3].result, "1.323910");
        assert_eq!(rows[1].region, "r∈[0, 1], θ∈[0.0°, 180.0°], z∈[0, 2]");
        assert_eq!(rows[0].volume, "37.6991");
    }

    #[test]
    fn test_preset_table() {
        let rows = preset_rows(&CylindricalCalculator::new());
        let table = preset_table(&rows);
        assert!(table.contains("Simple cylinder"));
        assert!(table.contains("r*exp(-z)"));
        assert!(table.contains("Volume"));
    }
}
