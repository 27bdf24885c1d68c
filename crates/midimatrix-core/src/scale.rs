//! Linear range mapping for matrix targets

/// Input range of 7-bit values (note, velocity, pressure, controller)
pub const SEVEN_BIT_RANGE: (f32, f32) = (0.0, 127.0);
/// Input range of pitch-bend values
pub const PITCH_BEND_RANGE: (f32, f32) = (-8192.0, 8191.0);

/// Map `value` from `input_min..input_max` onto `output_min..output_max`.
///
/// No clamping: values outside the input range extrapolate. The extremes map
/// exactly onto the output extremes. Returns `None` for a zero-width input
/// range.
///
/// # Example
/// ```
/// use midimatrix_core::scale_value;
/// assert_eq!(scale_value(127.0, 0.0, 127.0, 0.25, 0.75), Some(0.75));
/// assert_eq!(scale_value(5.0, 3.0, 3.0, 0.0, 1.0), None);
/// ```
pub fn scale_value(
    value: f32,
    input_min: f32,
    input_max: f32,
    output_min: f32,
    output_max: f32,
) -> Option<f32> {
    if input_max == input_min {
        return None;
    }
    if value == input_min {
        return Some(output_min);
    }
    if value == input_max {
        return Some(output_max);
    }

    let (value, input_min, input_max) = (value as f64, input_min as f64, input_max as f64);
    let (output_min, output_max) = (output_min as f64, output_max as f64);
    let scaled = output_min + (output_max - output_min) * (value - input_min) / (input_max - input_min);
    Some(scaled as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_are_exact() {
        for &(out_min, out_max) in &[(0.0, 1.0), (0.1, 0.3), (0.9, 0.2), (0.33, 0.67)] {
            assert_eq!(scale_value(0.0, 0.0, 127.0, out_min, out_max), Some(out_min));
            assert_eq!(scale_value(127.0, 0.0, 127.0, out_min, out_max), Some(out_max));
            assert_eq!(scale_value(-8192.0, -8192.0, 8191.0, out_min, out_max), Some(out_min));
            assert_eq!(scale_value(8191.0, -8192.0, 8191.0, out_min, out_max), Some(out_max));
        }
    }

    #[test]
    fn test_monotonic_over_seven_bit_range() {
        let (lo, hi) = SEVEN_BIT_RANGE;
        let mut prev = f32::NEG_INFINITY;
        for v in 0..=127 {
            let scaled = scale_value(v as f32, lo, hi, 0.2, 0.8).unwrap();
            assert!(scaled >= prev, "value {v} scaled to {scaled} below {prev}");
            prev = scaled;
        }
    }

    #[test]
    fn test_midpoint_and_inverted_output() {
        let mid = scale_value(0.0, -100.0, 100.0, 0.0, 1.0).unwrap();
        assert!((mid - 0.5).abs() < 1e-6);

        let inverted = scale_value(32.0, 0.0, 128.0, 1.0, 0.0).unwrap();
        assert!((inverted - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_zero_width_input_is_rejected() {
        assert_eq!(scale_value(1.0, 64.0, 64.0, 0.0, 1.0), None);
    }

    #[test]
    fn test_no_clamping() {
        let above = scale_value(200.0, 0.0, 100.0, 0.0, 1.0).unwrap();
        assert!((above - 2.0).abs() < 1e-6);
    }
}
