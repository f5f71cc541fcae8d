use glam::Vec3;

use crate::camera::Orientation;
use crate::capability::CharacterBody;

/// Directional flags driven by press/release events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocomotionIntent {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl LocomotionIntent {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.back || self.left || self.right)
    }
}

/// Turns intent into a horizontal walk velocity for the physics character.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    intent: LocomotionIntent,
    walk_speed: f32,
    last_walk: Vec3,
}

impl LocomotionController {
    pub fn new(walk_speed: f32) -> Self {
        Self {
            intent: LocomotionIntent::default(),
            walk_speed,
            last_walk: Vec3::ZERO,
        }
    }

    pub fn set_intent(&mut self, forward: bool, back: bool, left: bool, right: bool) {
        self.intent = LocomotionIntent {
            forward,
            back,
            left,
            right,
        };
    }

    pub fn intent(&self) -> LocomotionIntent {
        self.intent
    }

    pub fn intent_mut(&mut self) -> &mut LocomotionIntent {
        &mut self.intent
    }

    pub fn clear_intent(&mut self) {
        self.intent = LocomotionIntent::default();
    }

    pub fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    /// Velocity handed to the character on the last tick.
    pub fn last_walk(&self) -> Vec3 {
        self.last_walk
    }

    /// Jumps go straight to the character; it decides whether it is grounded enough.
    pub fn request_jump<C: CharacterBody + ?Sized>(&self, character: &mut C) {
        character.jump();
    }

    /// Body-space walk velocity for the current flags. Opposite flags cancel;
    /// diagonals are normalized so strafing forward is no faster than walking.
    pub fn walk_velocity(&self, orientation: &Orientation) -> Vec3 {
        let forward = orientation.body_forward();
        let left = orientation.body_left();

        let mut direction = Vec3::ZERO;
        if self.intent.forward {
            direction += forward;
        }
        if self.intent.back {
            direction -= forward;
        }
        if self.intent.left {
            direction += left;
        }
        if self.intent.right {
            direction -= left;
        }
        direction.y = 0.0;

        direction.normalize_or_zero() * self.walk_speed
    }

    pub fn tick<C: CharacterBody + ?Sized>(&mut self, orientation: &Orientation, character: &mut C) {
        self.last_walk = self.walk_velocity(orientation);
        character.set_walk_direction(self.last_walk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockPhysics;

    const SPEED: f32 = 5.0;

    fn yawed(yaw: f32) -> Orientation {
        Orientation {
            body_yaw: yaw,
            head_pitch: 0.0,
        }
    }

    #[test]
    fn test_forward_matches_body_forward_for_any_yaw() {
        let mut loco = LocomotionController::new(SPEED);
        loco.set_intent(true, false, false, false);
        for step in 0..32 {
            let yaw = -3.1 + step as f32 * 0.2;
            let orientation = yawed(yaw);
            let v = loco.walk_velocity(&orientation);
            let expected = orientation.body_forward() * SPEED;
            assert!((v - expected).length() < 1e-4, "yaw {}: {:?} vs {:?}", yaw, v, expected);
        }
    }

    #[test]
    fn test_opposite_flags_cancel() {
        let mut loco = LocomotionController::new(SPEED);
        loco.set_intent(true, true, false, false);
        assert_eq!(loco.walk_velocity(&yawed(0.8)), Vec3::ZERO);

        loco.set_intent(false, false, true, true);
        assert_eq!(loco.walk_velocity(&yawed(-2.0)), Vec3::ZERO);

        loco.set_intent(true, true, true, true);
        assert_eq!(loco.walk_velocity(&yawed(1.0)), Vec3::ZERO);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut loco = LocomotionController::new(SPEED);
        loco.set_intent(true, false, true, false);
        let v = loco.walk_velocity(&yawed(0.0));
        assert!((v.length() - SPEED).abs() < 1e-4);
        assert!(v.x > 0.0 && v.z > 0.0);
    }

    #[test]
    fn test_pitch_never_lifts_movement() {
        let mut loco = LocomotionController::new(SPEED);
        loco.set_intent(true, false, false, true);
        let v = loco.walk_velocity(&Orientation {
            body_yaw: 0.3,
            head_pitch: -1.4,
        });
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_tick_forwards_walk_direction() {
        let mut loco = LocomotionController::new(SPEED);
        let mut body = MockPhysics::default();
        loco.set_intent(true, false, false, false);
        loco.tick(&yawed(0.0), &mut body);

        let walk = *body.walks.last().unwrap();
        assert!((walk - Vec3::new(0.0, 0.0, SPEED)).length() < 1e-6);
        assert_eq!(loco.last_walk(), walk);
    }

    #[test]
    fn test_idle_sends_zero() {
        let mut loco = LocomotionController::new(SPEED);
        let mut body = MockPhysics::default();
        loco.tick(&yawed(1.0), &mut body);
        assert_eq!(body.walks, vec![Vec3::ZERO]);
        assert!(loco.intent().is_idle());
    }

    #[test]
    fn test_jump_is_forwarded() {
        let loco = LocomotionController::new(SPEED);
        let mut body = MockPhysics {
            grounded: true,
            ..Default::default()
        };
        loco.request_jump(&mut body);
        assert_eq!(body.jumps, 1);
    }
}
