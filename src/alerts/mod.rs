// src/alerts/mod.rs

pub mod engine;
pub mod registry;
pub mod speech_gate;
pub mod ui_bus;

pub use engine::AlertEngine;
pub use registry::{AlertRegistry, SubmitOutcome};
pub use speech_gate::SpeechGate;
pub use ui_bus::{UiCommand, UiCommandBus};
