//! Tolerance constants for audio assertions.

/// Floating point rounding errors (exact gains, stored values).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Minimum RMS for a registered, sounding division.
pub const AUDIBLE_RMS: f32 = 0.001;
