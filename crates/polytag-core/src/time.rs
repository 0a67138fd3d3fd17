/// Tick rate the reference durations and per-tick constants are tuned for.
pub const REFERENCE_TICK_RATE: f32 = 60.0;

/// Whole ticks covering `secs` of wall-clock time at `tick_rate` Hz.
///
/// Non-positive or non-finite inputs yield zero ticks.
pub fn secs_to_ticks(secs: f32, tick_rate: f32) -> u32 {
    let ticks = secs * tick_rate;
    if !ticks.is_finite() || ticks <= 0.0 {
        return 0;
    }
    ticks.round() as u32
}

/// Wall-clock seconds covered by `ticks` at `tick_rate` Hz.
pub fn ticks_to_secs(ticks: u64, tick_rate: f32) -> f32 {
    if tick_rate <= 0.0 {
        return 0.0;
    }
    ticks as f32 / tick_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rate_matches_frames() {
        assert_eq!(secs_to_ticks(5.0, REFERENCE_TICK_RATE), 300);
        assert_eq!(secs_to_ticks(3.0, REFERENCE_TICK_RATE), 180);
    }

    #[test]
    fn scales_with_tick_rate() {
        assert_eq!(secs_to_ticks(5.0, 30.0), 150);
        assert_eq!(secs_to_ticks(10.0, 144.0), 1440);
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(secs_to_ticks(-1.0, 60.0), 0);
        assert_eq!(secs_to_ticks(f32::NAN, 60.0), 0);
        assert_eq!(secs_to_ticks(1.0, 0.0), 0);
        assert_eq!(ticks_to_secs(10, 0.0), 0.0);
    }

    #[test]
    fn ticks_to_secs_inverts() {
        assert_eq!(ticks_to_secs(120, 60.0), 2.0);
    }
}
