use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert an f64 to Fixed64, rounding toward negative infinity.
///
/// For durations the sim loop subtracts repeatedly: `k` rounded-down ticks
/// never exceed `k` times the real tick, so elapsed host time is never
/// short of a tick it should have run.
#[inline]
pub fn f64_to_fixed64_floor(v: f64) -> Fixed64 {
    Fixed64::from_bits((v * FRAC_SCALE).floor() as i64)
}

const FRAC_SCALE: f64 = (1u64 << Fixed64::FRAC_NBITS) as f64;

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp to the closed unit interval.
#[inline]
pub fn clamp01(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
        assert_eq!(fixed64_to_f64(a * b), 3.0);
    }

    #[test]
    fn floor_conversion_never_rounds_up() {
        // 0.02 is not representable; nearest rounding lands above it.
        let nearest = f64_to_fixed64(0.02);
        let floor = f64_to_fixed64_floor(0.02);
        assert!(floor < nearest);
        assert!(fixed64_to_f64(floor) <= 0.02);
        assert!(floor * 25 <= f64_to_fixed64(0.5));
        // Exact values convert unchanged.
        assert_eq!(f64_to_fixed64_floor(0.25), f64_to_fixed64(0.25));
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a, b);
        assert_eq!(a * f64_to_fixed64(3.0), b * f64_to_fixed64(3.0));
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(f64_to_fixed64(-0.5)), Fixed64::ZERO);
        assert_eq!(clamp01(f64_to_fixed64(1.25)), Fixed64::ONE);
        assert_eq!(clamp01(f64_to_fixed64(0.5)), f64_to_fixed64(0.5));
    }
}
