pub mod result;
pub mod round;
