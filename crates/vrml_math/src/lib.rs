// Re-export glam for convenience
pub use glam::*;

// VRML math types
mod aabb;
mod interval;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use transform::{compose_transform, Rotation};

/// Linear tolerance used for geometric comparisons (matches the modelling
/// kernel's confusion distance).
pub const CONFUSION: f64 = 1.0e-7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dvec3_creation() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_confusion_is_tiny() {
        assert!(CONFUSION > 0.0);
        assert!(CONFUSION < 1.0e-6);
    }
}
