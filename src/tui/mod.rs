pub mod app;
pub mod nav;

use std::io::{self, Stdout};
use std::panic;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::warn;

use crate::config::TuiConfig;
use crate::error::Result;
use crate::storage::Storage;

pub use app::{Browser, SystemOpener, UrlOpener};
pub use nav::{NavEvent, NavigationState};

/// Raw mode and the alternate screen, undone on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // From here on, any early return drops the guard and restores.
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show) {
        warn!("Failed to leave alternate screen: {}", e);
    }
}

/// Take over the terminal and browse until the user quits. The terminal is
/// restored on every exit path, panics included.
pub fn run_interactive<S: Storage>(browser: &mut Browser<S>, config: &TuiConfig) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    let res = run_session(browser, config);
    drop(panic::take_hook());
    res
}

fn run_session<S: Storage>(browser: &mut Browser<S>, config: &TuiConfig) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal: Terminal<CrosstermBackend<Stdout>> = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    run_loop(&mut terminal, browser, config)
}

fn run_loop<B: ratatui::backend::Backend, S: Storage>(
    terminal: &mut Terminal<B>,
    browser: &mut Browser<S>,
    config: &TuiConfig,
) -> Result<()> {
    let opener = SystemOpener;
    loop {
        let height = terminal.size()?.height;
        let page_size = nav::page_size(height, config.min_page_size, config.reserved_rows);
        browser.sync_viewport(page_size);
        terminal.draw(|f| browser.render(f, page_size))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && browser.handle_key(key, page_size, &opener) {
                return Ok(());
            }
        }
    }
}
