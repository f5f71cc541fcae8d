//! UI-thread state: main menu, settings screen and the test HUD.
//!
//! `UiState` lives on the UI thread and is only ever mutated there, either by
//! a `MenuAction` or by a command the simulation posted to the UI queue. It
//! reaches the simulation exclusively through the simulation's command queue.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::command::CommandQueue;
use crate::error::CommandError;
use crate::objective::HudUpdate;
use crate::simulation::{SimSnapshot, Simulation};

pub const DEFAULT_VOLUME: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Main,
    Settings,
    Hidden,
}

/// Something the player did in the menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    NewGame,
    LoadGame,
    Settings,
    Back,
    /// Slider position, `0..=100`.
    Volume(u8),
    Fullscreen(bool),
    /// Lift the player one unit; a debug button on the HUD.
    RaisePlayer,
    TogglePostEffect(String),
    Snapshot,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActionError(pub String);

impl fmt::Display for ParseActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised menu action: '{}'", self.0)
    }
}

impl std::error::Error for ParseActionError {}

impl FromStr for MenuAction {
    type Err = ParseActionError;

    /// Parses lines like `new`, `volume 40`, `fullscreen on`, `toggle bloom`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();
        let err = || ParseActionError(line.trim().to_string());

        match (verb.as_str(), arg) {
            ("new", None) | ("start", None) => Ok(MenuAction::NewGame),
            ("load", None) => Ok(MenuAction::LoadGame),
            ("settings", None) => Ok(MenuAction::Settings),
            ("back", None) => Ok(MenuAction::Back),
            ("volume", Some(v)) => v.parse::<u8>().map(|v| MenuAction::Volume(v.min(100))).map_err(|_| err()),
            ("fullscreen", Some(v)) => match v {
                "on" | "true" | "1" => Ok(MenuAction::Fullscreen(true)),
                "off" | "false" | "0" => Ok(MenuAction::Fullscreen(false)),
                _ => Err(err()),
            },
            ("raise", None) => Ok(MenuAction::RaisePlayer),
            ("toggle", Some(effect)) => Ok(MenuAction::TogglePostEffect(effect.to_string())),
            ("snapshot", None) | ("status", None) => Ok(MenuAction::Snapshot),
            ("quit", None) | ("exit", None) => Ok(MenuAction::Quit),
            _ => Err(err()),
        }
    }
}

/// HUD text lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudState {
    pub prompt: Option<String>,
    pub timer: Option<String>,
    pub raise_clicks: u32,
}

impl HudState {
    pub fn apply(&mut self, update: &HudUpdate) {
        match update {
            HudUpdate::ShowPrompt(text) => self.prompt = Some(text.clone()),
            HudUpdate::HidePrompt => self.prompt = None,
            HudUpdate::SetTimer(text) => self.timer = Some(text.clone()),
            HudUpdate::RemoveTimer => self.timer = None,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(timer) = &self.timer {
            lines.push(timer.clone());
        }
        if let Some(prompt) = &self.prompt {
            lines.push(prompt.clone());
        }
        if self.raise_clicks > 0 {
            lines.push(format!("Raised: {}", self.raise_clicks));
        }
        lines
    }
}

pub struct UiState {
    pub screen: MenuScreen,
    /// Volume slider, `0..=100`.
    pub volume: u8,
    pub fullscreen: bool,
    pub hud: HudState,
    pub last_snapshot: Option<SimSnapshot>,
    pub quit_requested: bool,
    sim: CommandQueue<Simulation>,
}

impl UiState {
    pub fn new(sim: CommandQueue<Simulation>) -> Self {
        Self {
            screen: MenuScreen::Main,
            volume: DEFAULT_VOLUME,
            fullscreen: false,
            hud: HudState::default(),
            last_snapshot: None,
            quit_requested: false,
            sim,
        }
    }

    pub fn sim_queue(&self) -> &CommandQueue<Simulation> {
        &self.sim
    }

    pub fn handle(&mut self, action: MenuAction) {
        tracing::debug!("Menu action: {:?}", action);
        match action {
            MenuAction::NewGame => {
                self.screen = MenuScreen::Hidden;
                self.sim.enqueue(|sim: &mut Simulation| {
                    sim.set_cursor_visible(false);
                    Ok(())
                });
            }
            MenuAction::LoadGame => {
                tracing::info!("Load game is not available");
            }
            MenuAction::Settings => self.screen = MenuScreen::Settings,
            MenuAction::Back => self.screen = MenuScreen::Main,
            MenuAction::Volume(value) => {
                self.volume = value.min(100);
                let volume = f32::from(self.volume) / 100.0;
                self.sim.enqueue(move |sim: &mut Simulation| {
                    sim.set_master_volume(volume);
                    Ok(())
                });
            }
            MenuAction::Fullscreen(on) => {
                self.fullscreen = on;
                self.sim.enqueue(move |sim: &mut Simulation| {
                    sim.set_fullscreen(on);
                    Ok(())
                });
            }
            MenuAction::RaisePlayer => {
                self.hud.raise_clicks += 1;
                self.sim.enqueue(|sim: &mut Simulation| {
                    sim.nudge_player(Vec3::Y);
                    Ok(())
                });
            }
            MenuAction::TogglePostEffect(effect) => {
                self.sim.enqueue(move |sim: &mut Simulation| {
                    sim.toggle_post_effect(&effect)
                        .map(|_| ())
                        .ok_or_else(|| CommandError::failed(format!("unknown post effect '{}'", effect)))
                });
            }
            MenuAction::Snapshot => {
                self.sim.enqueue(|sim: &mut Simulation| {
                    let snapshot = sim.snapshot();
                    sim.ui_queue().enqueue(move |ui: &mut UiState| {
                        ui.last_snapshot = Some(snapshot);
                        Ok(())
                    });
                    Ok(())
                });
            }
            MenuAction::Quit => {
                self.quit_requested = true;
                self.sim.enqueue(|sim: &mut Simulation| {
                    sim.request_exit();
                    Ok(())
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> UiState {
        UiState::new(CommandQueue::new("sim"))
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("new".parse::<MenuAction>(), Ok(MenuAction::NewGame));
        assert_eq!("Volume 40".parse::<MenuAction>(), Ok(MenuAction::Volume(40)));
        assert!("volume 250".parse::<MenuAction>().is_err());
        assert_eq!("volume 120".parse::<MenuAction>(), Ok(MenuAction::Volume(100)));
        assert_eq!("fullscreen on".parse::<MenuAction>(), Ok(MenuAction::Fullscreen(true)));
        assert_eq!(
            "toggle bloom".parse::<MenuAction>(),
            Ok(MenuAction::TogglePostEffect("bloom".to_string()))
        );
        assert!("fly".parse::<MenuAction>().is_err());
        assert!("".parse::<MenuAction>().is_err());
    }

    #[test]
    fn test_screen_navigation_is_local() {
        let mut ui = ui();
        assert_eq!(ui.screen, MenuScreen::Main);
        ui.handle(MenuAction::Settings);
        assert_eq!(ui.screen, MenuScreen::Settings);
        ui.handle(MenuAction::Back);
        assert_eq!(ui.screen, MenuScreen::Main);
        ui.handle(MenuAction::LoadGame);
        assert!(ui.sim_queue().is_empty());
    }

    #[test]
    fn test_sim_bound_actions_enqueue() {
        let mut ui = ui();
        ui.handle(MenuAction::NewGame);
        ui.handle(MenuAction::Volume(40));
        ui.handle(MenuAction::Fullscreen(true));
        ui.handle(MenuAction::RaisePlayer);
        ui.handle(MenuAction::Snapshot);
        ui.handle(MenuAction::Quit);

        assert_eq!(ui.sim_queue().len(), 6);
        assert_eq!(ui.screen, MenuScreen::Hidden);
        assert_eq!(ui.volume, 40);
        assert!(ui.fullscreen);
        assert_eq!(ui.hud.raise_clicks, 1);
        assert!(ui.quit_requested);
    }

    #[test]
    fn test_hud_updates() {
        let mut hud = HudState::default();
        hud.apply(&HudUpdate::SetTimer("Time: 3".into()));
        hud.apply(&HudUpdate::ShowPrompt("Press R to Exit".into()));
        assert_eq!(hud.lines(), vec!["Time: 3", "Press R to Exit"]);

        hud.apply(&HudUpdate::HidePrompt);
        hud.apply(&HudUpdate::RemoveTimer);
        assert!(hud.lines().is_empty());
    }
}
