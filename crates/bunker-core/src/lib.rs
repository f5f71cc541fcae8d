//! bunker core: the headless walking simulation.
//!
//! Locomotion, camera rig, auto-focus, light registry and the command queues
//! that connect the simulation thread to the UI thread. Physics, rendering and
//! audio are reached through the traits in [`capability`].

pub mod camera;
pub mod capability;
pub mod command;
pub mod config;
pub mod error;
pub mod focus;
pub mod input;
pub mod lights;
pub mod locomotion;
pub mod objective;
pub mod post;
pub mod scene;
pub mod simulation;
pub mod ui;

#[cfg(test)]
mod test_support;
