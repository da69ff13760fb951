use crate::cylindrical::figure::Surface;
use chrono::Local;
use csv::Writer;
use log::{LevelFilter, warn};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// debug, info, warn, error, off (or none); anything else is None
pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" | "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// log_<date>_<time>.txt
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Logger writing into a newly created file at `path`.
pub fn file_logger<P: AsRef<Path>>(
    level: LevelFilter,
    path: P,
) -> std::io::Result<Box<WriteLogger<File>>> {
    let file = File::create(path)?;
    Ok(WriteLogger::new(level, Config::default(), file))
}

/// Installs the terminal logger and, if asked, a file logger next to it.
///
/// Returns false when a logger is already installed; the first one stays in place. A log file
/// that can not be created is reported and the terminal logger is installed alone.
pub fn init_logger(level: LevelFilter, log_to_file: bool) -> bool {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));
    let mut file_failure = None;
    if log_to_file {
        let path = log_file_name();
        match file_logger(level, &path) {
            Ok(logger) => loggers.push(logger),
            Err(e) => file_failure = Some(format!("can not create log file {}: {}", path, e)),
        }
    }
    let installed = CombinedLogger::init(loggers).is_ok();
    if let Some(message) = file_failure {
        if installed {
            warn!("{}", message);
        } else {
            eprintln!("{}", message);
        }
    }
    installed
}

/// Writes the samples of a surface as rows `row, col, x, y, z`.
pub fn save_surface_to_csv<P: AsRef<Path>>(surface: &Surface, filename: P) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(filename)?;
    writer.write_record(["row", "col", "x", "y", "z"])?;
    for ((row, col), x) in surface.x.indexed_iter() {
        let y = surface.y[[row, col]];
        let z = surface.z[[row, col]];
        writer.write_record(&[
            row.to_string(),
            col.to_string(),
            x.to_string(),
            y.to_string(),
            z.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cylindrical::bounds::IntegrationBounds;
    use crate::cylindrical::figure::SurfaceRole;
    use crate::cylindrical::mesh::{MeshResolution, region_figure};
    use tempfile::tempdir;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_log_level(" warn "), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("none"), Some(LevelFilter::Off));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_log_file_name() {
        let name = log_file_name();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger(LevelFilter::Off, false);
        assert!(!init_logger(LevelFilter::Off, false));
    }

    #[test]
    fn test_file_logger() {
        let dir = tempdir().unwrap();
        assert!(file_logger(LevelFilter::Info, dir.path().join("run.txt")).is_ok());
        assert!(dir.path().join("run.txt").exists());
        let missing = dir.path().join("no_such_dir").join("run.txt");
        assert!(file_logger(LevelFilter::Info, missing).is_err());
    }

    #[test]
    fn test_save_surface_to_csv() {
        let bounds = IntegrationBounds::new(0.0, 1.0, 0.0, 1.0, 0.0, 2.0);
        let resolution = MeshResolution {
            theta_steps: 3,
            r_steps: 2,
            z_steps: 2,
        };
        let figure = region_figure(&bounds, &resolution);
        let top = figure.surface(SurfaceRole::TopCap).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("top.csv");
        save_surface_to_csv(top, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["row", "col", "x", "y", "z"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(&rows[5][4], "2");
    }
}
