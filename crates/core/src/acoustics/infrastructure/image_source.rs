use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, UnitSphere};

use crate::acoustics::domain::room_geometry::{Position, RoomDimensions};
use crate::shared::error::AugmentError;

/// Taps of the windowed-sinc fractional delay filter.
pub const FRACTIONAL_DELAY_TAPS: usize = 81;

const HALF_TAPS: usize = FRACTIONAL_DELAY_TAPS / 2;

/// Closest an image may get to the microphone before the 1/d law blows up.
pub const MIN_SOURCE_DISTANCE: f64 = 1e-3;

/// A virtual mirror source and the number of wall bounces it stands for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSource {
    pub position: Position,
    pub reflections: u32,
}

/// Mirror image coordinate along one axis for lattice index `m`.
fn image_coordinate(m: i64, extent: f64, source: f64) -> f64 {
    let base = m as f64 * extent;
    if m.rem_euclid(2) == 0 {
        base + source
    } else {
        base + extent - source
    }
}

/// All image sources of a shoebox room with `|mx| + |my| + |mz| <= max_order`,
/// generated lazily shell by shell in increasing reflection count.
///
/// The direct path (`reflections == 0`) is always the first item. High orders
/// produce millions of images, so callers should consume the iterator rather
/// than collect it.
pub fn image_sources(
    dimensions: &RoomDimensions,
    source: &Position,
    max_order: usize,
) -> impl Iterator<Item = ImageSource> {
    let [lx, ly, lz] = dimensions.extents();
    let source = *source;
    (0..=max_order as i64).flat_map(move |order| {
        (-order..=order).flat_map(move |mx| {
            let rem_x = order - mx.abs();
            (-rem_x..=rem_x).flat_map(move |my| {
                let rem_y = rem_x - my.abs();
                // Both signs of mz lie on the shell unless they coincide at zero.
                let z_count = if rem_y == 0 { 1 } else { 2 };
                [rem_y, -rem_y]
                    .into_iter()
                    .take(z_count)
                    .map(move |mz| ImageSource {
                        position: Position::new(
                            image_coordinate(mx, lx, source.x),
                            image_coordinate(my, ly, source.y),
                            image_coordinate(mz, lz, source.z),
                        ),
                        reflections: order as u32,
                    })
            })
        })
    })
}

/// Displace a reflected image uniformly inside a ball of `max_jitter`
/// metres. The direct path is returned untouched.
pub fn jitter_image<R: Rng + ?Sized>(
    mut image: ImageSource,
    max_jitter: f64,
    rng: &mut R,
) -> ImageSource {
    if max_jitter <= 0.0 || image.reflections == 0 {
        return image;
    }
    let [dx, dy, dz]: [f64; 3] = UnitSphere.sample(rng);
    let radius = max_jitter * rng.gen::<f64>().cbrt();
    let p = &mut image.position;
    p.x += dx * radius;
    p.y += dy * radius;
    p.z += dz * radius;
    image
}

fn hann_window() -> [f64; FRACTIONAL_DELAY_TAPS] {
    std::array::from_fn(|k| {
        0.5 - 0.5 * (2.0 * PI * k as f64 / (FRACTIONAL_DELAY_TAPS - 1) as f64).cos()
    })
}

/// Add a windowed-sinc impulse of `amplitude` delayed by `start + HALF_TAPS + frac`.
///
/// With an integer tap offset `n`, `sin(pi (n - frac)) = -(-1)^n sin(pi frac)`,
/// so one sine per impulse covers every tap.
fn add_impulse(
    rir: &mut [f64],
    start: usize,
    frac: f64,
    amplitude: f64,
    window: &[f64; FRACTIONAL_DELAY_TAPS],
) {
    let taps = &mut rir[start..start + FRACTIONAL_DELAY_TAPS];
    if frac.abs() < 1e-9 {
        taps[HALF_TAPS] += amplitude * window[HALF_TAPS];
        return;
    }
    let sin_frac = (PI * frac).sin();
    for (k, (tap, w)) in taps.iter_mut().zip(window).enumerate() {
        let n = k as i64 - HALF_TAPS as i64;
        let sign = if n.rem_euclid(2) == 0 { -1.0 } else { 1.0 };
        *tap += amplitude * w * sign * sin_frac / (PI * (n as f64 - frac));
    }
}

/// Render the room impulse response seen at `mic`.
///
/// Each image adds `beta^reflections / (4 pi d)` through a Hann-windowed
/// sinc centred at `d / c * fs + HALF_TAPS` samples. The response grows to
/// fit the latest arrival.
pub fn synthesize_rir<I>(
    images: I,
    mic: &Position,
    reflection_coefficient: f64,
    sample_rate: u32,
    speed_of_sound: f64,
) -> Result<Vec<f64>, AugmentError>
where
    I: IntoIterator<Item = ImageSource>,
{
    let fs = sample_rate as f64;
    let window = hann_window();
    let mut rir = Vec::new();
    for image in images {
        let distance = image.position.distance(mic);
        if !distance.is_finite() || distance < MIN_SOURCE_DISTANCE {
            return Err(AugmentError::geometry(format!(
                "image source at {distance:.2e} m from the microphone"
            )));
        }
        let amplitude =
            reflection_coefficient.powi(image.reflections as i32) / (4.0 * PI * distance);
        let delay = distance / speed_of_sound * fs;
        // Snap near-integer delays so rounding noise cannot shift the peak a tap.
        let nearest = delay.round();
        let whole = if (delay - nearest).abs() < 1e-9 {
            nearest
        } else {
            delay.floor()
        };
        let start = whole as usize;
        let end = start + FRACTIONAL_DELAY_TAPS;
        if end > rir.len() {
            rir.resize(end, 0.0);
        }
        add_impulse(&mut rir, start, delay - whole, amplitude, &window);
    }
    Ok(rir)
}
