//! Terminal front end for the counter screen.
//!
//! [`Ui`] owns the terminal for as long as it lives: raw mode, the alternate
//! screen and focus reporting are switched on in [`Ui::init`] and restored on
//! drop.

pub mod input;
pub mod render;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, DisableFocusChange, EnableFocusChange};
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::crossterm::ExecutableCommand;
use ratatui::Terminal;
use tracing::{debug, warn};

use crate::controller::TotalController;
use crate::error::Result;
use crate::storage::RecordStore;

pub use input::{action_for, Action};
pub use render::render;

/// The running terminal screen.
pub struct Ui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    tick: Duration,
}

impl std::fmt::Debug for Ui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ui").field("tick", &self.tick).finish()
    }
}

impl Ui {
    /// Take over the terminal, polling for input every `tick`.
    ///
    /// If setup fails part way, whatever was already switched on is switched
    /// back off before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be switched into raw mode or
    /// the alternate screen.
    pub fn init(tick: Duration) -> Result<Self> {
        enable_raw_mode()?;
        let terminal = undo_on_error(enter_screen(), restore_terminal)?;
        Ok(Self { terminal, tick })
    }

    /// Drive the screen until the user quits.
    ///
    /// Losing focus and quitting both persist the total. So does leaving with
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or reading terminal events fails. Store
    /// failures are handled by the controller and never surface here.
    pub fn run<S: RecordStore>(&mut self, controller: &mut TotalController<S>) -> Result<()> {
        let result = self.event_loop(controller);
        persist_on_error(controller, result)
    }

    fn event_loop<S: RecordStore>(&mut self, controller: &mut TotalController<S>) -> Result<()> {
        loop {
            controller.expire_notification(Instant::now());
            controller.sync();
            let view = controller.view();
            self.terminal.draw(|frame| render(frame, &view))?;

            if !event::poll(self.tick)? {
                continue;
            }
            let Some(action) = action_for(&event::read()?) else {
                continue;
            };
            if apply(controller, action) {
                return Ok(());
            }
        }
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

/// Hand `action` to the controller. Returns `true` when the screen should close.
pub(crate) fn apply<S: RecordStore>(controller: &mut TotalController<S>, action: Action) -> bool {
    debug!("Screen action: {:?}", action);
    match action {
        Action::Increment => controller.increment(),
        Action::Background => controller.persist(),
        Action::Foreground => controller.resume(),
        Action::Quit => {
            controller.persist();
            return true;
        }
    }
    false
}

fn persist_on_error<S: RecordStore>(
    controller: &mut TotalController<S>,
    result: Result<()>,
) -> Result<()> {
    if let Err(e) = &result {
        warn!("Screen failed, saving total before exit: {}", e);
        controller.persist();
    }
    result
}

fn undo_on_error<T>(result: Result<T>, undo: impl FnOnce()) -> Result<T> {
    if result.is_err() {
        undo();
    }
    result
}

fn enter_screen() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableFocusChange)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(DisableFocusChange);
    let _ = io::stdout().execute(LeaveAlternateScreen);
}
