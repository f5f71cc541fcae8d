//! The UI thread. Runs the menu/HUD model on its own tokio current-thread
//! runtime, reading menu actions as text lines from stdin and draining the
//! UI command queue every 16 ms.

use std::thread::JoinHandle;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

use bunker_core::command::CommandQueue;
use bunker_core::simulation::Simulation;
use bunker_core::ui::{MenuAction, MenuScreen, UiState};

const DRAIN_INTERVAL: Duration = Duration::from_millis(16);

pub struct UiThread {
    handle: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl UiThread {
    pub fn spawn(
        sim_queue: CommandQueue<Simulation>,
        ui_queue: CommandQueue<UiState>,
        read_stdin: bool,
    ) -> std::io::Result<Self> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = std::thread::Builder::new()
            .name("bunker-ui".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::error!("UI runtime failed to start: {}", e);
                        return;
                    }
                };
                let ui = UiState::new(sim_queue);
                runtime.block_on(run(ui, ui_queue, shutdown_rx, read_stdin));
                // A pending stdin read would otherwise hold the runtime open.
                runtime.shutdown_background();
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Stop the UI loop and wait for the thread.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("UI thread panicked");
            }
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn next_line(lines: &mut Option<Lines<BufReader<Stdin>>>) -> Option<String> {
    match lines {
        Some(reader) => match reader.next_line().await {
            Ok(Some(line)) => Some(line),
            Ok(None) => {
                tracing::debug!("stdin closed, menu input disabled");
                *lines = None;
                None
            }
            Err(e) => {
                tracing::warn!("stdin read failed: {}", e);
                *lines = None;
                None
            }
        },
        None => std::future::pending().await,
    }
}

async fn run(
    mut ui: UiState,
    ui_queue: CommandQueue<UiState>,
    mut shutdown: watch::Receiver<bool>,
    read_stdin: bool,
) {
    let mut lines = read_stdin.then(|| BufReader::new(tokio::io::stdin()).lines());
    let mut interval = tokio::time::interval(DRAIN_INTERVAL);
    let mut view = UiView::default();

    print_screen(ui.screen);
    loop {
        tokio::select! {
            line = next_line(&mut lines) => {
                let Some(line) = line else { continue };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<MenuAction>() {
                    Ok(action) => ui.handle(action),
                    Err(e) => tracing::warn!("{}", e),
                }
            }
            _ = interval.tick() => {
                ui_queue.drain_and_execute_all(&mut ui);
                view.present(&mut ui);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
        if ui.quit_requested {
            break;
        }
    }
    tracing::debug!("UI thread stopped");
}

/// Last state shown to the player, so only changes are printed.
#[derive(Default)]
struct UiView {
    screen: Option<MenuScreen>,
    hud: Vec<String>,
}

impl UiView {
    fn present(&mut self, ui: &mut UiState) {
        if self.screen != Some(ui.screen) {
            if self.screen.is_some() {
                print_screen(ui.screen);
            }
            self.screen = Some(ui.screen);
        }

        let hud = ui.hud.lines();
        if hud != self.hud {
            if !hud.is_empty() {
                println!("[hud] {}", hud.join(" | "));
            }
            self.hud = hud;
        }

        if let Some(snapshot) = ui.last_snapshot.take() {
            match serde_json::to_string(&snapshot) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("Snapshot serialization failed: {}", e),
            }
        }
    }
}

fn print_screen(screen: MenuScreen) {
    match screen {
        MenuScreen::Main => println!("[menu] new | load | settings | quit"),
        MenuScreen::Settings => println!("[settings] volume <0-100> | fullscreen on|off | toggle <effect> | back"),
        MenuScreen::Hidden => println!("[game] raise | snapshot | toggle <effect>"),
    }
}
