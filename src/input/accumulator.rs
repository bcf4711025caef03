//! Sub-Pixel Accumulation
//!
//! Scaled fractional deltas are summed per axis; only the truncated integer
//! part is emitted and the remainder carries over to the next delta, so many
//! small movements add up to the same total as one large movement.

/// Two-axis fractional accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubPixelAccumulator {
    x: f64,
    y: f64,
}

impl SubPixelAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delta without taking anything out
    pub fn add(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Take out the whole part of the accumulated motion
    ///
    /// Truncates toward zero, so the retained remainder always has the sign
    /// of the accumulated motion and a magnitude below one.
    pub fn take(&mut self) -> (i32, i32) {
        let x = self.x.trunc() as i32;
        let y = self.y.trunc() as i32;

        self.x -= x as f64;
        self.y -= y as f64;

        (x, y)
    }

    /// Add a delta and take out the whole part
    pub fn accumulate(&mut self, dx: f64, dy: f64) -> (i32, i32) {
        self.add(dx, dy);
        self.take()
    }

    /// Accumulated motion not yet taken out
    pub fn remainder(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Drop any carried fraction
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_part_emitted() {
        let mut acc = SubPixelAccumulator::new();
        assert_eq!(acc.accumulate(2.5, -1.25), (2, -1));
        let (rx, ry) = acc.remainder();
        assert!((rx - 0.5).abs() < 1e-9);
        assert!((ry + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_small_deltas_sum_to_large_delta() {
        let mut split = SubPixelAccumulator::new();
        let mut total = (0, 0);
        for _ in 0..3 {
            let (x, y) = split.accumulate(0.6, 0.6);
            total.0 += x;
            total.1 += y;
        }

        let mut whole = SubPixelAccumulator::new();
        assert_eq!(whole.accumulate(1.8, 1.8), total);
        assert_eq!(total, (1, 1));
    }

    #[test]
    fn test_fractions_below_one_emit_nothing() {
        let mut acc = SubPixelAccumulator::new();
        assert_eq!(acc.accumulate(0.3, -0.3), (0, 0));
        assert_eq!(acc.accumulate(0.3, -0.3), (0, 0));
        assert_eq!(acc.accumulate(0.5, -0.5), (1, -1));
    }

    #[test]
    fn test_held_motion_released_in_one_take() {
        let mut acc = SubPixelAccumulator::new();
        acc.add(4.0, 1.5);
        acc.add(3.5, 0.0);
        assert_eq!(acc.take(), (7, 1));
        assert_eq!(acc.take(), (0, 0));
    }

    #[test]
    fn test_reset_clears_remainder() {
        let mut acc = SubPixelAccumulator::new();
        acc.accumulate(0.9, 0.9);
        acc.reset();
        assert_eq!(acc.remainder(), (0.0, 0.0));
        assert_eq!(acc.accumulate(0.5, 0.5), (0, 0));
    }
}
