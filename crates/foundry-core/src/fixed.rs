use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every simulation quantity (seconds, pixels, radians) is a `Fixed64` so
/// that two runs with the same inputs produce bit-identical state.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/FFI, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Pi in Q32.32.
#[inline]
pub fn pi() -> Fixed64 {
    f64_to_fixed64(std::f64::consts::PI)
}

/// Move `current` toward `target` by at most `max_step`, never overshooting.
pub fn approach(current: Fixed64, target: Fixed64, max_step: Fixed64) -> Fixed64 {
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else if delta > Fixed64::ZERO {
        current + max_step
    } else {
        current - max_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn power_of_two_fractions_are_exact() {
        let dt = f64_to_fixed64(1.0 / 64.0);
        let mut t = Fixed64::ZERO;
        for _ in 0..64 {
            t += dt;
        }
        assert_eq!(t, Fixed64::from_num(1));
    }

    #[test]
    fn pi_is_close() {
        assert!((fixed64_to_f64(pi()) - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn approach_clamps_at_target() {
        let one = Fixed64::from_num(1);
        assert_eq!(approach(Fixed64::ZERO, one, f64_to_fixed64(0.25)), f64_to_fixed64(0.25));
        assert_eq!(approach(f64_to_fixed64(0.9), one, f64_to_fixed64(0.25)), one);
        assert_eq!(approach(one, Fixed64::ZERO, f64_to_fixed64(0.5)), f64_to_fixed64(0.5));
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a * f64_to_fixed64(3.0), b * f64_to_fixed64(3.0));
    }
}
