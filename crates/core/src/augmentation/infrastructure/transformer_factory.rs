use rand::RngCore;

use crate::acoustics::infrastructure::room_acoustics_transformer::RoomAcousticsTransformer;
use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_transformer::AudioTransformer;
use crate::augmentation::domain::noise_library::NoiseLibrary;
use crate::pipeline::pipeline_config::TransformConfig;
use crate::shared::error::AugmentError;

use super::noise_mix_transformer::NoiseMixTransformer;
use super::tempo_shift_transformer::TempoShiftTransformer;

/// Builds the transformer a descriptor asks for.
///
/// Noise libraries are read through `reader` at `sample_rate`; the room pool
/// draws from `rng`. Invalid parameters surface here, before any file is
/// processed.
pub fn create_transformer(
    config: &TransformConfig,
    reader: &dyn AudioReader,
    sample_rate: u32,
    rng: &mut dyn RngCore,
) -> Result<Box<dyn AudioTransformer>, AugmentError> {
    match config {
        TransformConfig::Noise { library, mu, sd } => {
            let library = NoiseLibrary::load(library, reader, sample_rate)?;
            log::info!(
                "Noise mixing with {} clips (gain |N({mu}, {sd})|)",
                library.len()
            );
            Ok(Box::new(NoiseMixTransformer::new(library, *mu, *sd)?))
        }
        TransformConfig::Room(settings) => {
            log::info!(
                "Room simulation with {} rooms ({:?} output)",
                settings.pool_size,
                settings.output_length
            );
            Ok(Box::new(RoomAcousticsTransformer::new(*settings, rng)?))
        }
        TransformConfig::Tempo { ratio } => {
            log::info!("Tempo shift by ratio {ratio}");
            Ok(Box::new(TempoShiftTransformer::new(*ratio)?))
        }
    }
}
