pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }
}

/// Compares two optional readings: both missing, or both present and
/// approximately equal.
impl FloatExt for Option<f64> {
    fn approximately_eq(self, other: Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.approximately_eq(b),
            _ => false,
        }
    }
}
