//! Pure plane-projection acceptance predicate.

use serde::{Deserialize, Serialize};

/// Rectangular acceptance window on a transverse plane.
///
/// Units follow the dataset (cm). Bounds are inclusive on all four edges.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Acceptance {
    /// Position of the projection plane on the transport axis.
    pub plane_z: f32,
    /// Lower x bound of the window.
    pub x_min: f32,
    /// Upper x bound of the window.
    pub x_max: f32,
    /// Lower y bound of the window.
    pub y_min: f32,
    /// Upper y bound of the window.
    pub y_max: f32,
}

impl Acceptance {
    /// Window at `plane_z` with the given transverse bounds.
    #[must_use]
    pub const fn new(plane_z: f32, x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self { plane_z, x_min, x_max, y_min, y_max }
    }

    /// Decide whether a particle at `position` travelling along `direction`
    /// crosses the window.
    ///
    /// Particles not advancing toward the plane (`w <= 0`, NaN included) are
    /// rejected outright. A position already at or past the plane is tested
    /// as it stands; there is no backward extrapolation. Otherwise the
    /// straight-line projection `t = (plane_z - z) / w` is applied to the
    /// transverse coordinates before the bounds test.
    #[must_use]
    pub fn accepts(&self, position: (f32, f32, f32), direction: (f32, f32, f32)) -> bool {
        let (x, y, z) = position;
        let (u, v, w) = direction;
        if w <= 0.0 || !w.is_finite() {
            return false;
        }

        let (px, py) = if z >= self.plane_z {
            (x, y)
        } else {
            let t = (self.plane_z - z) / w;
            (x + u * t, y + v * t)
        };

        px >= self.x_min && px <= self.x_max && py >= self.y_min && py <= self.y_max
    }
}

impl Default for Acceptance {
    /// The legacy treatment-head cut: plane at 100 cm, 14 x 14 cm window.
    fn default() -> Self {
        Self::new(100.0, -7.0, 7.0, -7.0, 7.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_particles_are_rejected_anywhere() {
        let a = Acceptance::default();
        assert!(!a.accepts((0.0, 0.0, 50.0), (0.0, 0.0, -1.0)));
        assert!(!a.accepts((0.0, 0.0, 50.0), (0.1, 0.1, 0.0)));
        assert!(!a.accepts((0.0, 0.0, 150.0), (0.0, 0.0, -1.0)));
        assert!(!a.accepts((0.0, 0.0, 0.0), (0.0, 0.0, f32::NAN)));
    }

    #[test]
    fn at_or_past_the_plane_uses_the_raw_point() {
        let a = Acceptance::default();
        // Inside the window at the plane itself, heading away transversally:
        // no projection happens, so it stays accepted.
        assert!(a.accepts((6.9, 0.0, 100.0), (0.9, 0.0, 0.435_889_9)));
        assert!(a.accepts((6.9, 0.0, 130.0), (0.9, 0.0, 0.435_889_9)));
        // Outside the window past the plane.
        assert!(!a.accepts((8.0, 0.0, 130.0), (0.0, 0.0, 1.0)));
    }

    #[test]
    fn projection_scenario_from_fifty_cm() {
        let a = Acceptance::default();
        // t = (100 - 50) / 1 = 50, lands at (5, 0): inside.
        assert!(a.accepts((0.0, 0.0, 50.0), (0.1, 0.0, 1.0)));
        // Same footing but u = 1 lands at x = 50: outside.
        assert!(!a.accepts((0.0, 0.0, 50.0), (1.0, 0.0, 1.0)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let a = Acceptance::default();
        // t = 10, lands exactly on x_min.
        assert!(a.accepts((-6.0, 0.0, 90.0), (-0.1, 0.0, 1.0)));
        // And exactly on the corner.
        assert!(a.accepts((7.0, 7.0, 100.0), (0.0, 0.0, 1.0)));
        // One step outside.
        assert!(!a.accepts((7.1, 7.0, 100.0), (0.0, 0.0, 1.0)));
    }
}
