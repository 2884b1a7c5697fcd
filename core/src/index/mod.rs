pub mod builder;
pub mod frame_order;

pub use builder::{DetectionIndexBuilder, ObjectIndex, Summary};
pub use frame_order::{compare_frames, format_duration, format_timestamp, frame_number, sort_frames};
