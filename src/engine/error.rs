use thiserror::Error;

/// Raised when the engine is set up against a staff that cannot be measured.
///
/// This is the only failure the engine reports as an error. It happens once, when
/// a layout snapshot is captured, never per input event.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("staff {staff} has not been laid out by the renderer yet")]
    StaffNotRendered { staff: usize },

    #[error("staff {staff} reports unusable line spacing {spacing}")]
    InvalidLineSpacing { staff: usize, spacing: f64 },
}
