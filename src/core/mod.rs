pub mod config;
pub mod constants;
pub mod crs;
pub mod geo;
pub mod grid;
pub mod map;
pub mod matrix;
pub mod viewport;
