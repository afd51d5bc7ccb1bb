/// Sample rate every loaded and written signal must have.
pub const SAMPLE_RATE: u32 = 16000;

/// File extensions (lowercase) treated as augmentable audio.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav"];

/// Speed of sound in air (m/s) used by the room simulation.
pub const SPEED_OF_SOUND: f64 = 343.0;

/// Attempts at drawing a point strictly inside a room before giving up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Attempts at drawing a room whose inverse-Sabine absorption is valid.
pub const MAX_ROOM_ATTEMPTS: usize = 100;

/// Attempts at synthesizing a non-degenerate room response per call.
pub const MAX_SYNTHESIS_ATTEMPTS: usize = 10;
