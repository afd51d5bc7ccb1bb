use rand::RngCore;

use super::audio_segment::AudioSegment;
use crate::shared::error::AugmentError;

/// Domain interface for one stochastic waveform augmentation.
///
/// Parameters are fixed at construction; every random draw made while
/// transforming comes from the `rng` passed in, so a call is reproducible
/// from the RNG state alone. Implementations are shared read-only across
/// worker threads.
pub trait AudioTransformer: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    fn transform(
        &self,
        audio: &mut AudioSegment,
        rng: &mut dyn RngCore,
    ) -> Result<(), AugmentError>;
}
