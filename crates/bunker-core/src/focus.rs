use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capability::SceneRaycast;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FocusSettings {
    #[serde(default = "default_initial_distance")]
    pub initial_distance: f32,
    #[serde(default = "default_initial_range")]
    pub initial_range: f32,
    /// Closest distance the focus plane is allowed to sit at.
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    /// Target used when the ray hits nothing.
    #[serde(default = "default_far_default")]
    pub far_default: f32,
    /// Smoothing constant, per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_range_scale")]
    pub range_scale: f32,
    #[serde(default = "default_min_range")]
    pub min_range: f32,
    /// Hits beyond this count as misses.
    #[serde(default = "default_max_ray_distance")]
    pub max_ray_distance: f32,
}

fn default_initial_distance() -> f32 {
    50.0
}
fn default_initial_range() -> f32 {
    10.0
}
fn default_min_distance() -> f32 {
    0.5
}
fn default_far_default() -> f32 {
    100.0
}
fn default_speed() -> f32 {
    10.0
}
fn default_range_scale() -> f32 {
    2.0
}
fn default_min_range() -> f32 {
    5.0
}
fn default_max_ray_distance() -> f32 {
    1000.0
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            initial_distance: default_initial_distance(),
            initial_range: default_initial_range(),
            min_distance: default_min_distance(),
            far_default: default_far_default(),
            speed: default_speed(),
            range_scale: default_range_scale(),
            min_range: default_min_range(),
            max_ray_distance: default_max_ray_distance(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusState {
    pub distance: f32,
    pub range: f32,
}

/// Auto-focus for the depth-of-field effect: one ray per frame, smoothed
/// toward whatever the camera is looking at.
#[derive(Debug, Clone)]
pub struct FocusEstimator {
    settings: FocusSettings,
    state: FocusState,
    last_target: f32,
}

impl FocusEstimator {
    pub fn new(settings: FocusSettings) -> Self {
        let state = FocusState {
            distance: settings.initial_distance,
            range: settings.initial_range,
        };
        Self {
            last_target: settings.initial_distance,
            settings,
            state,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn settings(&self) -> &FocusSettings {
        &self.settings
    }

    /// Target picked on the most recent tick.
    pub fn last_target(&self) -> f32 {
        self.last_target
    }

    /// Range for a focus distance; non-decreasing in `distance`.
    pub fn range_for(&self, distance: f32) -> f32 {
        (distance * self.settings.range_scale).max(self.settings.min_range)
    }

    pub fn target_for(&self, hit: Option<f32>) -> f32 {
        match hit {
            Some(d) if d.is_finite() && d >= 0.0 && d <= self.settings.max_ray_distance => {
                d.max(self.settings.min_distance)
            }
            _ => self.settings.far_default,
        }
    }

    pub fn tick<S: SceneRaycast + ?Sized>(
        &mut self,
        camera_position: Vec3,
        camera_direction: Vec3,
        scene: &S,
        dt: f32,
    ) -> FocusState {
        let hit = if camera_direction.length_squared() > 0.0 {
            scene.raycast(camera_position, camera_direction.normalize())
        } else {
            None
        };
        let target = self.target_for(hit);
        self.advance(target, dt)
    }

    /// One smoothing step toward `target`. Frame-rate independent and never
    /// overshoots.
    pub fn advance(&mut self, target: f32, dt: f32) -> FocusState {
        self.last_target = target;
        let t = if dt.is_finite() {
            (self.settings.speed * dt).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.state.distance += (target - self.state.distance) * t;
        self.state.range = self.range_for(self.state.distance);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockPhysics;

    fn scene_hitting(distance: Option<f32>) -> MockPhysics {
        MockPhysics {
            hit_distance: distance,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let focus = FocusEstimator::new(FocusSettings::default());
        assert_eq!(focus.state().distance, 50.0);
        assert_eq!(focus.state().range, 10.0);
    }

    #[test]
    fn test_hit_at_twelve_moves_toward_it() {
        let mut focus = FocusEstimator::new(FocusSettings {
            initial_distance: 50.0,
            ..Default::default()
        });
        let scene = scene_hitting(Some(12.0));
        let before = focus.state();

        let after = focus.tick(Vec3::ZERO, Vec3::Z, &scene, 0.1);
        assert_eq!(focus.last_target(), 12.0);
        // speed 10 * dt 0.1 clamps to a full step.
        assert!((after.distance - 12.0).abs() < 1e-5);
        assert!(after.distance < before.distance);
        assert!((after.range - 24.0).abs() < 1e-4);
    }

    #[test]
    fn test_range_grows_with_distance() {
        let mut focus = FocusEstimator::new(FocusSettings {
            initial_distance: 3.0,
            ..Default::default()
        });
        let scene = scene_hitting(Some(12.0));
        let mut previous = focus.state();
        for _ in 0..20 {
            let next = focus.tick(Vec3::ZERO, Vec3::Z, &scene, 0.02);
            assert!(next.distance > previous.distance);
            assert!(next.range >= previous.range);
            previous = next;
        }
    }

    #[test]
    fn test_converges_monotonically_from_both_sides() {
        for start in [80.0_f32, 1.0] {
            let mut focus = FocusEstimator::new(FocusSettings {
                initial_distance: start,
                ..Default::default()
            });
            let target = 20.0;
            let mut previous = focus.state().distance;
            let mut frames = 0;
            while (focus.state().distance - target).abs() > 1e-3 {
                let d = focus.advance(target, 1.0 / 60.0).distance;
                if start > target {
                    assert!(d <= previous && d >= target);
                } else {
                    assert!(d >= previous && d <= target);
                }
                previous = d;
                frames += 1;
                assert!(frames < 500, "did not converge from {}", start);
            }
        }
    }

    #[test]
    fn test_miss_targets_far_default() {
        let mut focus = FocusEstimator::new(FocusSettings::default());
        focus.tick(Vec3::ZERO, Vec3::Z, &scene_hitting(None), 0.016);
        assert_eq!(focus.last_target(), 100.0);
    }

    #[test]
    fn test_close_hit_clamped_to_min_distance() {
        let focus = FocusEstimator::new(FocusSettings::default());
        assert_eq!(focus.target_for(Some(0.1)), 0.5);
        assert_eq!(focus.target_for(Some(f32::NAN)), 100.0);
        assert_eq!(focus.target_for(Some(5000.0)), 100.0);
    }

    #[test]
    fn test_range_floor() {
        let focus = FocusEstimator::new(FocusSettings::default());
        assert_eq!(focus.range_for(0.5), 5.0);
        assert_eq!(focus.range_for(10.0), 20.0);
    }

    #[test]
    fn test_zero_dt_holds_state() {
        let mut focus = FocusEstimator::new(FocusSettings::default());
        let before = focus.state().distance;
        focus.advance(1.0, 0.0);
        assert_eq!(focus.state().distance, before);
    }
}
