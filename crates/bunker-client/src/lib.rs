pub mod audio;
pub mod cli;
pub mod engine;
pub mod headless;
pub mod input;
pub mod menu;
pub mod physics;
pub mod project;
pub mod renderer;
