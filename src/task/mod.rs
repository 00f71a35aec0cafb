mod render;
mod scene;
mod sequence;

pub use render::*;
pub use scene::*;
pub use sequence::*;

use crate::core::config_service::ConfigService;

pub fn register_tasks(service: &mut ConfigService) {
    service.register_task("render", render_task);
    service.register_task("render_sequence", render_sequence_task);
}
