pub mod bsdf;
pub mod camera;
pub mod core;
pub mod geometry;
pub mod task;
pub mod texture;

use crate::core::config_service::ConfigService;

/// Registers the built-in asset categories and tasks.
///
/// Categories load in this order, so a bsdf can refer to a texture and a geometry to a
/// bsdf, but not the other way round.
pub fn register_builtin(service: &mut ConfigService) {
    service.register_asset("texture", texture::load_texture);
    service.register_asset("bsdf", bsdf::load_bsdf);
    service.register_asset("geometry", geometry::load_geometry);
    service.register_asset("camera", camera::load_camera);
    task::register_tasks(service);
}
