use super::room_geometry::RoomDimensions;
use crate::shared::error::AugmentError;

/// Sabine constant for 3D rooms: `24 ln(10) / c` gives `RT60 = 0.161 V / (S a)`.
pub const SABINE_COEFFICIENT: f64 = 24.0;

/// Wall absorption and image-source order needed to reach a target RT60.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SabineEstimate {
    /// Uniform energy absorption coefficient, in (0, 1).
    pub absorption: f64,
    /// Reflection order whose images cover at least `c * rt60` metres.
    pub max_order: usize,
}

/// Invert Sabine's formula for a shoebox room.
///
/// `absorption = 24 ln(10) V / (c S RT60)`. Larger rooms and shorter target
/// RT60 need more absorption; a result of 1 or more cannot be realized and is
/// reported as a geometry error.
///
/// The order is the smallest one whose stack of mirrored rooms contains a
/// sphere of radius `c * rt60`: `ceil(c * rt60 / min(R) - 1)` where `R`
/// ranges over `l1 l2 / sqrt(l1^2 + l2^2)` for each pair of room extents.
pub fn inverse_sabine(
    rt60: f64,
    dimensions: &RoomDimensions,
    speed_of_sound: f64,
) -> Result<SabineEstimate, AugmentError> {
    let volume = dimensions.volume();
    let surface = dimensions.surface_area();
    let absorption =
        SABINE_COEFFICIENT * std::f64::consts::LN_10 * volume / (speed_of_sound * surface * rt60);

    if !absorption.is_finite() || absorption <= 0.0 {
        return Err(AugmentError::geometry(format!(
            "inverse Sabine produced invalid absorption {absorption} for {dimensions:?}, RT60 {rt60}"
        )));
    }
    if absorption >= 1.0 {
        return Err(AugmentError::geometry(format!(
            "room {:.2} x {:.2} x {:.2} m is too large for RT60 {rt60:.3} s (absorption {absorption:.3})",
            dimensions.length, dimensions.width, dimensions.height
        )));
    }

    let [l, w, h] = dimensions.extents();
    let min_radius = [(l, w), (l, h), (w, h)]
        .iter()
        .map(|&(a, b)| a * b / (a * a + b * b).sqrt())
        .fold(f64::INFINITY, f64::min);
    let max_order = (speed_of_sound * rt60 / min_radius - 1.0).ceil().max(0.0) as usize;

    Ok(SabineEstimate {
        absorption,
        max_order,
    })
}

/// Forward Sabine relation: RT60 produced by a uniform absorption.
pub fn sabine_rt60(absorption: f64, dimensions: &RoomDimensions, speed_of_sound: f64) -> f64 {
    SABINE_COEFFICIENT * std::f64::consts::LN_10 * dimensions.volume()
        / (speed_of_sound * dimensions.surface_area() * absorption)
}
