pub mod controller;
pub mod error;
pub mod mapper;
pub mod navigator;
pub mod pitch;
pub mod playback;
pub mod scoring;
pub mod selection;
pub mod validator;

#[allow(unused_imports)]
pub use self::{
    controller::{InteractionController, InteractionListener},
    error::EngineError,
    mapper::{Clef, PitchPositionMapper, StaffLayout, StaffMode, StaffPosition, StaffSurface},
    navigator::{KeyboardFocusState, KeyboardNavigator, NavOutcome, NavigationMode},
    pitch::{Accidental, NoteLetter, Pitch},
    playback::{LogPlayback, PlayIntent, Playback},
    selection::SelectionSet,
    validator::{ValidationResult, validate},
};
