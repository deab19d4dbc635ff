//! Data models for Dojo

mod record;

pub use record::{Combo, FrameData, Move, Record, RecordId, Translations};
