//! different utility modules used throughout the project
/// engine settings from a TOML document
pub mod config;
/// logger setup and saving of surfaces into csv files
pub mod logger;
/// tiny module to draw figures into png files
pub mod plots;
/// pretty-printing of the predefined examples as a table
pub mod report;
