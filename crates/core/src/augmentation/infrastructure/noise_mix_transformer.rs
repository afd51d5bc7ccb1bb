use rand::RngCore;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;
use crate::augmentation::domain::noise_library::NoiseLibrary;
use crate::augmentation::domain::sampling::{uniform_index, FoldedNormal};
use crate::shared::error::AugmentError;

/// Default mean of the noise gain distribution.
pub const DEFAULT_NOISE_MU: f64 = 0.25;

/// Default standard deviation of the noise gain distribution.
pub const DEFAULT_NOISE_SD: f64 = 0.1;

/// Adds a randomly chosen, randomly rotated noise clip at a random gain.
///
/// Per call:
/// 1. pick a clip uniformly from the library,
/// 2. rotate it right by a uniform offset in `[0, clip_len)`,
/// 3. repeat/truncate it circularly to the input length,
/// 4. add it scaled by `gain = |N(mu, sd)|`.
///
/// The gain is **folded normal** (half-normal when `mu == 0`), never a
/// plain normal: it is always non-negative and its mean is larger than `mu`
/// when `sd` is comparable to `mu`. Calibrate loudness with that in mind.
///
/// Output length always equals input length. Clips much shorter than the
/// input loop audibly; that is accepted.
pub struct NoiseMixTransformer {
    library: NoiseLibrary,
    gain: FoldedNormal,
}

impl NoiseMixTransformer {
    pub fn new(library: NoiseLibrary, mu: f64, sd: f64) -> Result<Self, AugmentError> {
        Ok(Self {
            library,
            gain: FoldedNormal::new(mu, sd)?,
        })
    }
}

impl AudioTransformer for NoiseMixTransformer {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn transform(
        &self,
        audio: &mut AudioSegment,
        rng: &mut dyn RngCore,
    ) -> Result<(), AugmentError> {
        let clip = self.library.clip(uniform_index(rng, self.library.len()));
        let noise = clip.samples();
        let offset = uniform_index(rng, noise.len());
        let gain = self.gain.sample(rng) as f32;

        for (i, sample) in audio.samples_mut().iter_mut().enumerate() {
            *sample += rotated_sample(noise, offset, i) * gain;
        }

        Ok(())
    }
}

/// Sample `i` of `noise` rotated right by `offset` and extended circularly.
fn rotated_sample(noise: &[f32], offset: usize, i: usize) -> f32 {
    let n = noise.len();
    noise[(i % n + n - offset) % n]
}
