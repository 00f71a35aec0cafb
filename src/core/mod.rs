pub mod asset_table;
pub mod color;
pub mod config_args;
pub mod config_service;
pub mod error;
pub mod film;
pub mod keyframe;
pub mod ray;
pub mod task;
pub mod transform;
