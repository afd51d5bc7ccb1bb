use rand::RngCore;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;
use crate::augmentation::infrastructure::transformer_factory::create_transformer;
use crate::shared::error::AugmentError;

use super::pipeline_config::PipelineConfig;

/// An ordered chain of transformers applied to every file.
///
/// Holds no per-call state, so one pipeline is shared by all worker threads.
/// An empty pipeline leaves audio untouched.
pub struct AugmentationPipeline {
    transformers: Vec<Box<dyn AudioTransformer>>,
}

impl AugmentationPipeline {
    pub fn new(transformers: Vec<Box<dyn AudioTransformer>>) -> Self {
        Self { transformers }
    }

    /// Builds every stage of `config` in order. `rng` seeds construction-time
    /// draws such as the room pool.
    pub fn from_config(
        config: &PipelineConfig,
        reader: &dyn AudioReader,
        sample_rate: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Self, AugmentError> {
        let transformers = config
            .transforms
            .iter()
            .map(|t| create_transformer(t, reader, sample_rate, &mut *rng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(transformers))
    }

    /// Runs each transformer once, in order, feeding each the previous output.
    pub fn apply(
        &self,
        audio: &mut AudioSegment,
        rng: &mut dyn RngCore,
    ) -> Result<(), AugmentError> {
        for transformer in &self.transformers {
            transformer.transform(audio, rng)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }
}
