pub mod daylight;
pub mod events;
