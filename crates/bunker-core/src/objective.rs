//! The run objective: find the exit door before the clock runs up too far.

use glam::Vec3;

use crate::scene::ExitZonePlacement;

pub const EXIT_PROMPT: &str = "Press R to Exit";

/// A change to the HUD, delivered to the UI thread through its queue.
#[derive(Debug, Clone, PartialEq)]
pub enum HudUpdate {
    ShowPrompt(String),
    HidePrompt,
    SetTimer(String),
    RemoveTimer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitZone {
    pub position: Vec3,
    pub radius: f32,
}

impl ExitZone {
    /// Inclusive of the boundary.
    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.position) <= self.radius
    }
}

impl From<ExitZonePlacement> for ExitZone {
    fn from(placement: ExitZonePlacement) -> Self {
        Self {
            position: placement.position,
            radius: placement.radius,
        }
    }
}

/// Whole seconds since the run started.
#[derive(Debug, Clone, Default)]
pub struct RunTimer {
    accumulated: f32,
    seconds: u32,
    stopped: bool,
}

impl RunTimer {
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Advance by `dt`. Returns the new count when a second boundary was crossed.
    pub fn advance(&mut self, dt: f32) -> Option<u32> {
        if self.stopped || !dt.is_finite() || dt <= 0.0 {
            return None;
        }
        self.accumulated += dt;
        let mut crossed = false;
        while self.accumulated >= 1.0 {
            self.accumulated -= 1.0;
            self.seconds += 1;
            crossed = true;
        }
        crossed.then_some(self.seconds)
    }

    pub fn label(&self) -> String {
        format!("Time: {}", self.seconds)
    }
}

/// Exit zone plus run timer. Produces HUD updates only when something changes.
#[derive(Debug, Clone, Default)]
pub struct Objective {
    zone: Option<ExitZone>,
    timer: RunTimer,
    prompt_visible: bool,
    exited: bool,
}

impl Objective {
    pub fn new(zone: Option<ExitZone>) -> Self {
        Self {
            zone,
            ..Default::default()
        }
    }

    pub fn zone(&self) -> Option<ExitZone> {
        self.zone
    }

    pub fn timer(&self) -> &RunTimer {
        &self.timer
    }

    pub fn exited(&self) -> bool {
        self.exited
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Per-frame update from the camera position.
    pub fn update(&mut self, camera_position: Vec3, dt: f32) -> Vec<HudUpdate> {
        let mut updates = Vec::new();
        if self.exited {
            return updates;
        }

        let inside = self.zone.map(|z| z.contains(camera_position)).unwrap_or(false);
        if inside != self.prompt_visible {
            self.prompt_visible = inside;
            updates.push(if inside {
                HudUpdate::ShowPrompt(EXIT_PROMPT.to_string())
            } else {
                HudUpdate::HidePrompt
            });
        }

        if self.timer.advance(dt).is_some() {
            updates.push(HudUpdate::SetTimer(self.timer.label()));
        }
        updates
    }

    /// Exit request. Only honoured inside the zone; ends the run for good.
    pub fn try_exit(&mut self, camera_position: Vec3) -> Option<Vec<HudUpdate>> {
        if self.exited {
            return None;
        }
        let zone = self.zone?;
        if !zone.contains(camera_position) {
            return None;
        }

        self.exited = true;
        self.prompt_visible = false;
        self.timer.stop();
        tracing::info!("Exited after {} seconds", self.timer.seconds());
        Some(vec![HudUpdate::HidePrompt, HudUpdate::RemoveTimer])
    }
}
