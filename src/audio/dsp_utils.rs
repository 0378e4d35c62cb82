// DSP utilities - Output hygiene for the real-time callback

/// Flush denormals to zero
///
/// Denormal floats (values extremely close to 0) are slow on some CPUs. The
/// decaying tails of the strum tones end up there.
///
/// Threshold: 1e-15 (far below 32-bit float noise)
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh
///
/// Keeps overlapping strums inside [-1, 1] without hard edges.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Full output chain for one mixed sample
#[inline]
pub fn finish_sample(x: f32) -> f32 {
    soft_clip(flush_denormals_to_zero(x))
}
