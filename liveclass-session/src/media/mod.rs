mod capture;
mod local_track;
mod synthetic_capture;
mod track_controller;

pub use capture::*;
pub use local_track::*;
pub use synthetic_capture::*;
pub use track_controller::*;
