// VRML describes a Transform node by its components; these helpers turn them
// into a matrix.

use glam::{DMat4, DQuat, DVec3};

use crate::CONFUSION;

/// An axis-angle rotation as written in VRML (`x y z angle`, radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub axis: DVec3,
    pub angle: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    /// The VRML default `0 0 1 0`.
    pub const IDENTITY: Rotation = Rotation {
        axis: DVec3::Z,
        angle: 0.0,
    };

    pub fn new(axis: DVec3, angle: f64) -> Self {
        Self { axis, angle }
    }

    /// True when the rotation has no effect.
    pub fn is_identity(&self) -> bool {
        self.angle.abs() < CONFUSION || self.axis.length_squared() < CONFUSION * CONFUSION
    }

    /// Convert to a unit quaternion. A degenerate axis yields identity.
    pub fn to_quat(&self) -> DQuat {
        if self.is_identity() {
            DQuat::IDENTITY
        } else {
            DQuat::from_axis_angle(self.axis.normalize(), self.angle)
        }
    }
}

/// Compose the VRML Transform components into a single matrix:
/// `T * C * R * SR * S * -SR * -C`.
pub fn compose_transform(
    translation: DVec3,
    rotation: Rotation,
    scale: DVec3,
    scale_orientation: Rotation,
    center: DVec3,
) -> DMat4 {
    let scale_rot = scale_orientation.to_quat();
    DMat4::from_translation(translation)
        * DMat4::from_translation(center)
        * DMat4::from_quat(rotation.to_quat())
        * DMat4::from_quat(scale_rot)
        * DMat4::from_scale(scale)
        * DMat4::from_quat(scale_rot.inverse())
        * DMat4::from_translation(-center)
}
