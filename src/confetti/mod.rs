// Decorative confetti: batch sampling plus the timed on/off state machine.
mod batch;
mod controller;

pub use batch::*;
pub use controller::*;
