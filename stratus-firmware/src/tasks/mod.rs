//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod camera;
pub mod logger;
pub mod radio;
pub mod telemetry;

pub use camera::camera_task;
pub use logger::logger_task;
pub use radio::radio_task;
pub use telemetry::telemetry_task;
