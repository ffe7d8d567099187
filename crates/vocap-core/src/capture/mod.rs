mod controller;
mod state;
mod transcript;

pub use {
    controller::{CaptureController, ControllerConfig},
    state::{CaptureState, ErrorKind},
    transcript::Transcript,
};
