pub mod notes;
pub mod player;
pub mod sequence;

pub use notes::{NoteName, C_MAJOR_SCALE};
pub use player::SequencePlayer;
pub use sequence::{ScheduledNote, Sequence, SequenceBuilder};
