pub mod config;
pub mod layout;
pub mod runner;
pub mod video_id;
