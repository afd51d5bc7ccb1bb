use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::convolution::fft_convolve;
use super::image_source::{image_sources, jitter_image, synthesize_rir, MIN_SOURCE_DISTANCE};
use crate::acoustics::domain::room_geometry::RoomInstance;
use crate::acoustics::domain::room_sampling::{sample_position, RoomSampling};
use crate::acoustics::domain::sabine::inverse_sabine;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;
use crate::augmentation::domain::sampling::uniform_index;
use crate::shared::constants::{MAX_SYNTHESIS_ATTEMPTS, SPEED_OF_SOUND};
use crate::shared::error::AugmentError;

/// Default number of rooms sampled up front.
pub const DEFAULT_ROOM_POOL_SIZE: usize = 10;

/// Default silence (s) placed before the reverberant signal.
pub const DEFAULT_ONSET_DELAY: f64 = 0.5;

/// Default radius (m) of the random image displacement.
pub const DEFAULT_MAX_IMAGE_JITTER: f64 = 0.05;

/// Length of the simulated output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomOutputLength {
    /// Onset silence, the convolved signal and the full reverberant tail.
    #[default]
    Full,
    /// Same number of samples as the input, starting after the onset.
    MatchInput,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSimulationSettings {
    #[serde(rename = "rooms")]
    pub pool_size: usize,
    pub sampling: RoomSampling,
    pub output_length: RoomOutputLength,
    pub onset_delay: f64,
    /// Optional cap on the reflection order. Uncapped rooms use the full
    /// inverse-Sabine order and so reverberate for the whole sampled RT60.
    pub max_order_limit: Option<usize>,
    pub max_image_jitter: f64,
}

impl Default for RoomSimulationSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_ROOM_POOL_SIZE,
            sampling: RoomSampling::default(),
            output_length: RoomOutputLength::default(),
            onset_delay: DEFAULT_ONSET_DELAY,
            max_order_limit: None,
            max_image_jitter: DEFAULT_MAX_IMAGE_JITTER,
        }
    }
}

impl RoomSimulationSettings {
    pub fn validate(&self) -> Result<(), AugmentError> {
        if self.pool_size == 0 {
            return Err(AugmentError::configuration(
                "room pool size must be at least 1",
            ));
        }
        if !self.onset_delay.is_finite() || self.onset_delay < 0.0 {
            return Err(AugmentError::configuration(format!(
                "onset delay must be a non-negative number of seconds, got {}",
                self.onset_delay
            )));
        }
        if !self.max_image_jitter.is_finite() || self.max_image_jitter < 0.0 {
            return Err(AugmentError::configuration(format!(
                "image jitter must be a non-negative distance, got {}",
                self.max_image_jitter
            )));
        }
        self.sampling.validate(SPEED_OF_SOUND)
    }
}

/// Reverberates speech by convolving it with a simulated room impulse
/// response (randomized image-source method in a shoebox room).
///
/// The room pool is drawn once at construction from the construction RNG and
/// never changes. Each call picks a room, places source and microphone and
/// renders a fresh response from the per-call RNG.
pub struct RoomAcousticsTransformer {
    settings: RoomSimulationSettings,
    rooms: Vec<RoomInstance>,
}

impl RoomAcousticsTransformer {
    pub fn new(
        settings: RoomSimulationSettings,
        rng: &mut dyn RngCore,
    ) -> Result<Self, AugmentError> {
        settings.validate()?;
        let rooms = (0..settings.pool_size)
            .map(|_| {
                settings
                    .sampling
                    .sample_room(&mut *rng, SPEED_OF_SOUND, settings.max_order_limit)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (i, room) in rooms.iter().enumerate() {
            let dims = room.geometry.dimensions();
            log::debug!(
                "Room {i}: {:.2} x {:.2} x {:.2} m, RT60 {:.2} s, absorption {:.3}, order {}",
                dims.length,
                dims.width,
                dims.height,
                room.geometry.rt60(),
                room.geometry.absorption(),
                room.max_order
            );
        }
        log::info!("Sampled a pool of {} simulated rooms", rooms.len());
        if let Some(limit) = settings.max_order_limit {
            let capped = rooms
                .iter()
                .filter(|r| {
                    inverse_sabine(r.geometry.rt60(), r.geometry.dimensions(), SPEED_OF_SOUND)
                        .is_ok_and(|estimate| estimate.max_order > r.max_order)
                })
                .count();
            if capped > 0 {
                log::warn!(
                    "{capped} of {} rooms capped at reflection order {limit}; their reverberation ends before the sampled RT60",
                    rooms.len()
                );
            }
        }

        Ok(Self { settings, rooms })
    }

    pub fn rooms(&self) -> &[RoomInstance] {
        &self.rooms
    }

    fn simulate(
        &self,
        samples: &[f32],
        sample_rate: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f32>, AugmentError> {
        let room = &self.rooms[uniform_index(rng, self.rooms.len())];
        let dims = room.geometry.dimensions();
        let source = sample_position(dims, rng)?;
        let mic = sample_position(dims, rng)?;
        if source.distance(&mic) < MIN_SOURCE_DISTANCE {
            return Err(AugmentError::geometry(
                "source and microphone placed at the same point",
            ));
        }

        let max_jitter = self.settings.max_image_jitter;
        let images = image_sources(dims, &source, room.max_order)
            .map(|image| jitter_image(image, max_jitter, &mut *rng));
        let rir = synthesize_rir(
            images,
            &mic,
            room.geometry.reflection_coefficient(),
            sample_rate,
            SPEED_OF_SOUND,
        )?;

        let signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let wet = fft_convolve(&signal, &rir);
        let onset = (self.settings.onset_delay * sample_rate as f64).round() as usize;
        Ok(assemble_output(
            &wet,
            samples.len(),
            onset,
            self.settings.output_length,
        ))
    }
}

fn assemble_output(
    wet: &[f64],
    input_len: usize,
    onset: usize,
    output_length: RoomOutputLength,
) -> Vec<f32> {
    match output_length {
        RoomOutputLength::Full => std::iter::repeat(0.0)
            .take(onset)
            .chain(wet.iter().map(|&v| v as f32))
            .collect(),
        RoomOutputLength::MatchInput => wet.iter().take(input_len).map(|&v| v as f32).collect(),
    }
}

impl AudioTransformer for RoomAcousticsTransformer {
    fn name(&self) -> &'static str {
        "room"
    }

    fn transform(
        &self,
        audio: &mut AudioSegment,
        rng: &mut dyn RngCore,
    ) -> Result<(), AugmentError> {
        let sample_rate = audio.sample_rate();
        let output =
            retry_synthesis(|| self.simulate(audio.samples(), sample_rate, &mut *rng))?;
        audio.set_samples(output);
        Ok(())
    }
}

/// Run `attempt` until it yields finite samples, at most
/// `MAX_SYNTHESIS_ATTEMPTS` times. Geometry failures and non-finite output
/// are retried; any other error is returned immediately.
fn retry_synthesis<F>(mut attempt: F) -> Result<Vec<f32>, AugmentError>
where
    F: FnMut() -> Result<Vec<f32>, AugmentError>,
{
    let mut last_failure = String::new();
    for n in 1..=MAX_SYNTHESIS_ATTEMPTS {
        match attempt() {
            Ok(output) if output.iter().all(|s| s.is_finite()) => return Ok(output),
            Ok(_) => last_failure = "non-finite samples in simulated output".to_string(),
            Err(AugmentError::Geometry(reason)) => last_failure = reason,
            Err(e) => return Err(e),
        }
        log::warn!("Room simulation attempt {n} failed: {last_failure}");
    }
    Err(AugmentError::geometry(format!(
        "room simulation failed after {MAX_SYNTHESIS_ATTEMPTS} attempts: {last_failure}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn speech_like(len: usize) -> AudioSegment {
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / 16000.0;
                0.3 * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
            })
            .collect();
        AudioSegment::new(samples, 16000)
    }

    fn settings(pool_size: usize, output_length: RoomOutputLength) -> RoomSimulationSettings {
        RoomSimulationSettings {
            pool_size,
            output_length,
            max_order_limit: Some(6),
            ..RoomSimulationSettings::default()
        }
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let run = || {
            let mut build_rng = StdRng::seed_from_u64(5);
            let room =
                RoomAcousticsTransformer::new(settings(5, RoomOutputLength::Full), &mut build_rng)
                    .unwrap();
            let mut audio = speech_like(3200);
            let mut call_rng = StdRng::seed_from_u64(11);
            room.transform(&mut audio, &mut call_rng).unwrap();
            audio
        };
        let a = run();
        let b = run();
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn test_pool_is_drawn_eagerly() {
        let mut rng = StdRng::seed_from_u64(1);
        let room =
            RoomAcousticsTransformer::new(settings(5, RoomOutputLength::Full), &mut rng).unwrap();
        assert_eq!(room.rooms().len(), 5);
        assert!(room.rooms().iter().all(|r| r.max_order <= 6));
    }

    #[test]
    fn test_default_settings_keep_full_inverse_sabine_order() {
        let mut rng = StdRng::seed_from_u64(4);
        let settings = RoomSimulationSettings {
            pool_size: 20,
            ..RoomSimulationSettings::default()
        };
        assert_eq!(settings.max_order_limit, None);
        let room = RoomAcousticsTransformer::new(settings, &mut rng).unwrap();
        for instance in room.rooms() {
            let expected = inverse_sabine(
                instance.geometry.rt60(),
                instance.geometry.dimensions(),
                SPEED_OF_SOUND,
            )
            .unwrap()
            .max_order;
            assert_eq!(instance.max_order, expected);
        }
    }

    #[test]
    fn test_retry_recovers_after_geometry_failure() {
        let mut calls = 0;
        let output = retry_synthesis(|| {
            calls += 1;
            if calls == 1 {
                Err(AugmentError::geometry("source and microphone coincide"))
            } else {
                Ok(vec![0.25; 4])
            }
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(output, vec![0.25; 4]);
    }

    #[test]
    fn test_retry_discards_non_finite_output() {
        let mut calls = 0;
        let output = retry_synthesis(|| {
            calls += 1;
            if calls < 3 {
                Ok(vec![0.1, f32::NAN])
            } else {
                Ok(vec![0.1, 0.2])
            }
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert_eq!(output, vec![0.1, 0.2]);
    }

    #[test]
    fn test_retry_gives_up_after_attempt_cap() {
        let mut calls = 0;
        let result = retry_synthesis(|| {
            calls += 1;
            Ok(vec![f32::INFINITY])
        });
        assert_eq!(calls, MAX_SYNTHESIS_ATTEMPTS);
        match result {
            Err(AugmentError::Geometry(reason)) => {
                assert!(reason.contains("after 10 attempts"), "{reason}")
            }
            other => panic!("expected geometry error, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_passes_other_errors_through() {
        let mut calls = 0;
        let result = retry_synthesis(|| {
            calls += 1;
            Err(AugmentError::configuration("bad settings"))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_empty_pool_is_configuration_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = RoomAcousticsTransformer::new(settings(0, RoomOutputLength::Full), &mut rng);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_negative_onset_is_configuration_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = RoomSimulationSettings {
            onset_delay: -0.1,
            ..RoomSimulationSettings::default()
        };
        assert!(matches!(
            RoomAcousticsTransformer::new(settings, &mut rng),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_unreachable_fixed_room_is_configuration_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = RoomSimulationSettings {
            sampling: RoomSampling::Fixed {
                length: 10.0,
                width: 10.0,
                height: 5.0,
                rt60: 0.1,
            },
            ..RoomSimulationSettings::default()
        };
        assert!(matches!(
            RoomAcousticsTransformer::new(settings, &mut rng),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_match_input_preserves_length() {
        let mut rng = StdRng::seed_from_u64(2);
        let room =
            RoomAcousticsTransformer::new(settings(3, RoomOutputLength::MatchInput), &mut rng)
                .unwrap();
        let mut audio = speech_like(4000);
        room.transform(&mut audio, &mut rng).unwrap();
        assert_eq!(audio.len(), 4000);
        assert_eq!(audio.sample_rate(), 16000);
        assert!(audio.samples().iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_full_output_adds_onset_and_tail() {
        let mut rng = StdRng::seed_from_u64(3);
        let room =
            RoomAcousticsTransformer::new(settings(3, RoomOutputLength::Full), &mut rng).unwrap();
        let mut audio = speech_like(4000);
        room.transform(&mut audio, &mut rng).unwrap();
        let onset = 8000;
        assert!(audio.len() > onset + 4000);
        assert!(audio.samples()[..onset].iter().all(|&s| s == 0.0));
        assert!(audio.samples()[onset..].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_assemble_output_lengths() {
        let wet = vec![1.0; 10];
        assert_eq!(assemble_output(&wet, 4, 3, RoomOutputLength::Full).len(), 13);
        let matched = assemble_output(&wet, 4, 3, RoomOutputLength::MatchInput);
        assert_eq!(matched, vec![1.0; 4]);
    }

    #[test]
    fn test_output_length_serializes_snake_case() {
        let json = serde_json::to_string(&RoomOutputLength::MatchInput).unwrap();
        assert_eq!(json, "\"match_input\"");
    }
}
