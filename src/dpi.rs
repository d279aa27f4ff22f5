/*
 * DPI scaling math. Coordinates in options structs are logical pixels at the
 * reference density (96 DPI); they are multiplied by actual/reference with
 * the same rounding as Win32 `MulDiv`.
 */
use crate::types::{Point, Size};

pub const REFERENCE_DPI: u32 = 96;

/// `a * b / c` rounded half away from zero, computed in 64 bits. Returns -1
/// when `c` is zero, like `MulDiv`.
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    if c == 0 {
        return -1;
    }
    let num = a as i64 * b as i64;
    let den = c as i64;
    let magnitude = (num.abs() + den.abs() / 2) / den.abs();
    let rounded = if (num < 0) != (den < 0) {
        -magnitude
    } else {
        magnitude
    };
    rounded.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dpi {
    pub x: u32,
    pub y: u32,
    pub reference: u32,
}

impl Dpi {
    pub const REFERENCE: u32 = REFERENCE_DPI;

    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            reference: REFERENCE_DPI,
        }
    }

    pub fn with_reference(mut self, reference: u32) -> Self {
        self.reference = reference;
        self
    }

    pub fn is_reference(&self) -> bool {
        self.x == self.reference && self.y == self.reference
    }

    pub fn scale_x(&self, value: i32) -> i32 {
        mul_div(value, self.x as i32, self.reference as i32)
    }

    pub fn scale_y(&self, value: i32) -> i32 {
        mul_div(value, self.y as i32, self.reference as i32)
    }

    pub fn scale_point(&self, pt: Point) -> Point {
        Point::new(self.scale_x(pt.x), self.scale_y(pt.y))
    }

    pub fn scale_size(&self, sz: Size) -> Size {
        Size::new(self.scale_x(sz.cx), self.scale_y(sz.cy))
    }

    /// Physical pixels back to logical units, e.g. for measured text.
    pub fn unscale_size(&self, sz: Size) -> Size {
        Size::new(
            mul_div(sz.cx, self.reference as i32, self.x as i32),
            mul_div(sz.cy, self.reference as i32, self.y as i32),
        )
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::new(REFERENCE_DPI, REFERENCE_DPI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_rounds_half_away_from_zero() {
        assert_eq!(mul_div(3, 3, 2), 5); // 4.5
        assert_eq!(mul_div(-3, 3, 2), -5);
        assert_eq!(mul_div(3, -3, 2), -5);
        assert_eq!(mul_div(3, 3, -2), -5);
        assert_eq!(mul_div(10, 1, 3), 3);
        assert_eq!(mul_div(1, 1, 0), -1);
    }

    #[test]
    fn reference_dpi_is_identity() {
        let dpi = Dpi::default();
        assert!(dpi.is_reference());
        assert_eq!(dpi.scale_point(Point::new(13, 27)), Point::new(13, 27));
    }

    #[test]
    fn scales_by_actual_over_reference() {
        // 144 DPI is 150%
        let dpi = Dpi::new(144, 120);
        assert_eq!(dpi.scale_size(Size::new(100, 23)), Size::new(150, 29));
        assert_eq!(dpi.scale_point(Point::new(7, 0)), Point::new(11, 0));
    }

    #[test]
    fn unscale_reverses_scale_for_measured_sizes() {
        let dpi = Dpi::new(144, 144);
        assert_eq!(dpi.unscale_size(Size::new(150, 30)), Size::new(100, 20));
        assert_eq!(Dpi::default().unscale_size(Size::new(77, 13)), Size::new(77, 13));
    }
}
