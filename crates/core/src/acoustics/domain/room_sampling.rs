use rand::Rng;
use serde::{Deserialize, Serialize};

use super::room_geometry::{
    validate_rt60, Position, RoomDimensions, RoomGeometry, RoomInstance, HEIGHT_RANGE,
    HORIZONTAL_RANGE, MAX_RT60,
};
use crate::augmentation::domain::sampling::{TruncatedNormal, UniformRange};
use crate::shared::constants::{MAX_PLACEMENT_ATTEMPTS, MAX_ROOM_ATTEMPTS};
use crate::shared::error::AugmentError;

/// Distributions used to draw random rooms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDistribution {
    pub length: TruncatedNormal,
    pub width: TruncatedNormal,
    pub height: TruncatedNormal,
    pub rt60: UniformRange,
}

impl Default for RoomDistribution {
    fn default() -> Self {
        let (h_lo, h_hi) = HORIZONTAL_RANGE;
        let (v_lo, v_hi) = HEIGHT_RANGE;
        Self {
            length: TruncatedNormal {
                mean: 6.0,
                std_dev: 3.0,
                low: h_lo,
                high: h_hi,
            },
            width: TruncatedNormal {
                mean: 5.0,
                std_dev: 2.0,
                low: h_lo,
                high: h_hi,
            },
            height: TruncatedNormal {
                mean: 2.4,
                std_dev: 0.6,
                low: v_lo,
                high: v_hi,
            },
            rt60: UniformRange {
                low: 0.3,
                high: 1.0,
            },
        }
    }
}

impl RoomDistribution {
    /// Every distribution must be valid and its support must stay inside the
    /// plausible-room bounds, so sampled rooms never need clamping.
    pub fn validate(&self) -> Result<(), AugmentError> {
        let (h_lo, h_hi) = HORIZONTAL_RANGE;
        let (v_lo, v_hi) = HEIGHT_RANGE;
        for (name, dist, lo, hi) in [
            ("length", &self.length, h_lo, h_hi),
            ("width", &self.width, h_lo, h_hi),
            ("height", &self.height, v_lo, v_hi),
        ] {
            dist.validate()?;
            if dist.low < lo || dist.high > hi {
                return Err(AugmentError::configuration(format!(
                    "{name} support [{}, {}] must lie within [{lo}, {hi}] m",
                    dist.low, dist.high
                )));
            }
        }
        self.rt60.validate()?;
        if self.rt60.low <= 0.0 || self.rt60.high > MAX_RT60 {
            return Err(AugmentError::configuration(format!(
                "RT60 range [{}, {}) must lie within (0, {MAX_RT60}] s",
                self.rt60.low, self.rt60.high
            )));
        }
        Ok(())
    }
}

/// How rooms for the simulation pool are produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoomSampling {
    /// Draw each room from the distributions.
    Randomized(RoomDistribution),
    /// Every room has the same configured size and RT60.
    Fixed {
        length: f64,
        width: f64,
        height: f64,
        rt60: f64,
    },
}

impl Default for RoomSampling {
    fn default() -> Self {
        RoomSampling::Randomized(RoomDistribution::default())
    }
}

impl RoomSampling {
    pub fn validate(&self, speed_of_sound: f64) -> Result<(), AugmentError> {
        match self {
            RoomSampling::Randomized(dist) => dist.validate(),
            RoomSampling::Fixed {
                length,
                width,
                height,
                rt60,
            } => {
                let dims = RoomDimensions::new(*length, *width, *height);
                dims.validate()?;
                validate_rt60(*rt60)?;
                // A fixed room that cannot reach its RT60 will never succeed.
                RoomGeometry::new(dims, *rt60, speed_of_sound)
                    .map(|_| ())
                    .map_err(|e| AugmentError::configuration(e.to_string()))
            }
        }
    }

    /// Draw a room, re-drawing when inverse Sabine yields no physical
    /// absorption. The reflection order is the inverse-Sabine order, capped
    /// at `max_order_limit` when one is given.
    pub fn sample_room<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        speed_of_sound: f64,
        max_order_limit: Option<usize>,
    ) -> Result<RoomInstance, AugmentError> {
        let mut last_error = None;
        for attempt in 1..=MAX_ROOM_ATTEMPTS {
            let (dims, rt60) = self.draw(rng);
            match RoomGeometry::new(dims, rt60, speed_of_sound) {
                Ok((geometry, estimate)) => {
                    let max_order = match max_order_limit {
                        Some(limit) if estimate.max_order > limit => {
                            log::debug!(
                                "Capping reflection order {} at {limit}",
                                estimate.max_order
                            );
                            limit
                        }
                        _ => estimate.max_order,
                    };
                    return Ok(RoomInstance {
                        geometry,
                        max_order,
                    });
                }
                Err(AugmentError::Geometry(reason)) => {
                    log::debug!("Room attempt {attempt} rejected: {reason}");
                    last_error = Some(reason);
                }
                Err(e) => return Err(e),
            }
        }
        Err(AugmentError::geometry(format!(
            "no valid room after {MAX_ROOM_ATTEMPTS} attempts: {}",
            last_error.unwrap_or_default()
        )))
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (RoomDimensions, f64) {
        match self {
            RoomSampling::Randomized(dist) => {
                let dims = RoomDimensions::new(
                    dist.length.sample(rng),
                    dist.width.sample(rng),
                    dist.height.sample(rng),
                );
                (dims, dist.rt60.sample(rng))
            }
            RoomSampling::Fixed {
                length,
                width,
                height,
                rt60,
            } => (RoomDimensions::new(*length, *width, *height), *rt60),
        }
    }
}

/// Uniform point strictly inside the room, by bounded rejection sampling.
pub fn sample_position<R: Rng + ?Sized>(
    dimensions: &RoomDimensions,
    rng: &mut R,
) -> Result<Position, AugmentError> {
    let extents = dimensions.extents();
    if extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
        return Err(AugmentError::geometry(format!(
            "cannot place a point in degenerate room {dimensions:?}"
        )));
    }
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = Position::from_coords(extents.map(|e| rng.gen_range(0.0..e)));
        if dimensions.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(AugmentError::geometry(format!(
        "no point strictly inside {dimensions:?} after {MAX_PLACEMENT_ATTEMPTS} attempts"
    )))
}
