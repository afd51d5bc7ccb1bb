use serde::{Deserialize, Serialize};

use super::sabine::{inverse_sabine, SabineEstimate};
use crate::shared::error::AugmentError;

/// Allowed room length and width (m).
pub const HORIZONTAL_RANGE: (f64, f64) = (3.0, 10.0);

/// Allowed ceiling height (m).
pub const HEIGHT_RANGE: (f64, f64) = (2.2, 5.0);

/// Largest supported reverberation time (s). RT60 must also be positive.
pub const MAX_RT60: f64 = 1.5;

/// A point in room coordinates (m), origin at a floor corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_coords(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Interior size of a rectangular (shoebox) room in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl RoomDimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    pub fn extents(&self) -> [f64; 3] {
        [self.length, self.width, self.height]
    }

    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    pub fn surface_area(&self) -> f64 {
        2.0 * (self.length * self.width + self.length * self.height + self.width * self.height)
    }

    /// True if `p` lies strictly inside the room (not on a wall).
    pub fn contains(&self, p: &Position) -> bool {
        p.coords()
            .iter()
            .zip(self.extents())
            .all(|(&c, extent)| c > 0.0 && c < extent)
    }

    /// Check the plausible-room bounds.
    pub fn validate(&self) -> Result<(), AugmentError> {
        let (h_lo, h_hi) = HORIZONTAL_RANGE;
        let (v_lo, v_hi) = HEIGHT_RANGE;
        let in_range = |v: f64, lo: f64, hi: f64| v.is_finite() && v >= lo && v <= hi;
        if !in_range(self.length, h_lo, h_hi) || !in_range(self.width, h_lo, h_hi) {
            return Err(AugmentError::configuration(format!(
                "room length and width must be within [{h_lo}, {h_hi}] m, got {:.3} x {:.3}",
                self.length, self.width
            )));
        }
        if !in_range(self.height, v_lo, v_hi) {
            return Err(AugmentError::configuration(format!(
                "room height must be within [{v_lo}, {v_hi}] m, got {:.3}",
                self.height
            )));
        }
        Ok(())
    }
}

/// Room size, target reverberation and the wall absorption that produces it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoomGeometry {
    dimensions: RoomDimensions,
    rt60: f64,
    absorption: f64,
}

impl RoomGeometry {
    /// Build a room and derive its absorption by inverse Sabine.
    ///
    /// Out-of-bounds dimensions or RT60 are configuration errors. A room too
    /// large to reach `rt60` with a physical absorption (>= 1) is a geometry
    /// error, which samplers treat as "draw again".
    pub fn new(
        dimensions: RoomDimensions,
        rt60: f64,
        speed_of_sound: f64,
    ) -> Result<(Self, SabineEstimate), AugmentError> {
        dimensions.validate()?;
        validate_rt60(rt60)?;
        let estimate = inverse_sabine(rt60, &dimensions, speed_of_sound)?;
        Ok((
            Self {
                dimensions,
                rt60,
                absorption: estimate.absorption,
            },
            estimate,
        ))
    }

    pub fn dimensions(&self) -> &RoomDimensions {
        &self.dimensions
    }

    pub fn rt60(&self) -> f64 {
        self.rt60
    }

    /// Uniform energy absorption coefficient of every wall, in (0, 1).
    pub fn absorption(&self) -> f64 {
        self.absorption
    }

    /// Pressure reflection coefficient `sqrt(1 - absorption)`.
    pub fn reflection_coefficient(&self) -> f64 {
        (1.0 - self.absorption).sqrt()
    }
}

pub fn validate_rt60(rt60: f64) -> Result<(), AugmentError> {
    if !rt60.is_finite() || rt60 <= 0.0 || rt60 > MAX_RT60 {
        return Err(AugmentError::configuration(format!(
            "RT60 must be within (0, {MAX_RT60}] s, got {rt60}"
        )));
    }
    Ok(())
}

/// A realized room ready for simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoomInstance {
    pub geometry: RoomGeometry,
    /// Highest total reflection count of the image sources used.
    pub max_order: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn room() -> RoomDimensions {
        RoomDimensions::new(6.0, 5.0, 2.5)
    }

    #[test]
    fn test_volume_and_surface() {
        let dims = room();
        assert_relative_eq!(dims.volume(), 75.0);
        assert_relative_eq!(dims.surface_area(), 2.0 * (30.0 + 15.0 + 12.5));
    }

    #[rstest]
    #[case::centre(Position::new(3.0, 2.5, 1.25), true)]
    #[case::near_corner(Position::new(0.01, 0.01, 0.01), true)]
    #[case::on_floor(Position::new(3.0, 2.5, 0.0), false)]
    #[case::on_far_wall(Position::new(6.0, 2.5, 1.0), false)]
    #[case::outside(Position::new(-1.0, 2.5, 1.0), false)]
    #[case::above_ceiling(Position::new(3.0, 2.5, 3.0), false)]
    fn test_contains_is_strict(#[case] p: Position, #[case] expected: bool) {
        assert_eq!(room().contains(&p), expected);
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 12.0);
        assert_relative_eq!(a.distance(&b), 13.0);
    }

    #[rstest]
    #[case::too_short(RoomDimensions::new(2.0, 5.0, 2.5))]
    #[case::too_wide(RoomDimensions::new(5.0, 11.0, 2.5))]
    #[case::too_low(RoomDimensions::new(5.0, 5.0, 2.0))]
    #[case::too_high(RoomDimensions::new(5.0, 5.0, 5.5))]
    #[case::nan(RoomDimensions::new(f64::NAN, 5.0, 2.5))]
    fn test_out_of_bounds_dimensions_rejected(#[case] dims: RoomDimensions) {
        assert!(matches!(
            dims.validate(),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-0.2)]
    #[case::too_long(1.6)]
    fn test_invalid_rt60_rejected(#[case] rt60: f64) {
        assert!(matches!(
            RoomGeometry::new(room(), rt60, 343.0),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_geometry_derives_absorption() {
        let (geometry, estimate) = RoomGeometry::new(room(), 0.6, 343.0).unwrap();
        assert!(geometry.absorption() > 0.0 && geometry.absorption() < 1.0);
        assert_relative_eq!(geometry.absorption(), estimate.absorption);
        assert_relative_eq!(
            geometry.reflection_coefficient(),
            (1.0 - geometry.absorption()).sqrt()
        );
    }
}
