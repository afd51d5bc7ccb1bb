use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Full linear convolution of `signal` with `kernel` via zero-padded FFTs.
///
/// The result has `signal.len() + kernel.len() - 1` samples (empty if either
/// input is empty).
pub fn fft_convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut a = padded(signal, fft_len);
    let mut b = padded(kernel, fft_len);
    forward.process(&mut a);
    forward.process(&mut b);

    for (x, y) in a.iter_mut().zip(&b) {
        *x *= y;
    }
    inverse.process(&mut a);

    let scale = 1.0 / fft_len as f64;
    a.iter().take(out_len).map(|c| c.re * scale).collect()
}

fn padded(values: &[f64], len: usize) -> Vec<Complex<f64>> {
    let mut buf = vec![Complex::new(0.0, 0.0); len];
    for (slot, &v) in buf.iter_mut().zip(values) {
        slot.re = v;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn direct_convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; signal.len() + kernel.len() - 1];
        for (i, s) in signal.iter().enumerate() {
            for (j, k) in kernel.iter().enumerate() {
                out[i + j] += s * k;
            }
        }
        out
    }

    #[test]
    fn test_matches_direct_convolution() {
        let signal: Vec<f64> = (0..97).map(|i| ((i * 7) % 13) as f64 - 6.0).collect();
        let kernel = [0.5, -0.25, 0.0, 0.125, 1.0];
        let fast = fft_convolve(&signal, &kernel);
        let slow = direct_convolve(&signal, &kernel);
        assert_eq!(fast.len(), slow.len());
        for (a, b) in fast.iter().zip(&slow) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unit_impulse_is_identity() {
        let signal = [0.1, 0.2, -0.3];
        let out = fft_convolve(&signal, &[1.0]);
        for (a, b) in out.iter().zip(&signal) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(fft_convolve(&[], &[1.0]).is_empty());
        assert!(fft_convolve(&[1.0], &[]).is_empty());
    }
}
