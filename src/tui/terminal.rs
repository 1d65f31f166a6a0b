//! Terminal plumbing for prompts: raw-mode acquisition with guaranteed
//! release, restoration hooks for panics and signals, and the inline
//! `ratatui` viewport prompts paint into.

use std::io::{self, BufRead, IsTerminal, Stdout, Write};

use crossterm::{
    cursor, event, execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::CrosstermBackend,
    text::Line,
    widgets::Paragraph,
    Terminal, TerminalOptions, Viewport,
};
use tracing::debug;

use crate::tui::keys::Key;

/// Raw input mode held for as long as the guard lives.
///
/// Dropping the guard restores cooked mode, so every exit path out of a
/// prompt (resolution, `?` on an error, unwinding) releases the terminal.
#[must_use = "raw mode ends when the guard is dropped"]
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        debug!("raw mode on");
        Ok(RawModeGuard { active: true })
    }

    /// A guard that owns nothing, for backends without a real terminal.
    pub fn inert() -> Self {
        RawModeGuard { active: false }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            debug!("raw mode off");
        }
    }
}

/// Put the terminal back into a usable state. Safe to call at any time.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = show_cursor(&mut io::stdout());
}

/// Emit the show-cursor sequence, but only into a terminal. Piped output
/// stays free of escape codes.
fn show_cursor<W: Write + IsTerminal>(out: &mut W) -> io::Result<()> {
    if !out.is_terminal() {
        return Ok(());
    }
    execute!(out, cursor::Show)
}

/// Restore the terminal before the default panic report is printed.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));
}

/// Watch for termination signals and restore the terminal before exiting.
#[cfg(unix)]
pub fn spawn_signal_watcher() -> io::Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP, SIGQUIT])?;
    std::thread::Builder::new()
        .name("signal-watch".into())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                restore_terminal();
                std::process::exit(128 + signal);
            }
        })?;
    Ok(())
}

#[cfg(not(unix))]
pub fn spawn_signal_watcher() -> io::Result<()> {
    Ok(())
}

/// Everything the prompt engine needs from the outside world.
pub trait PromptIo {
    /// Whether keypresses can be read interactively.
    fn is_interactive(&self) -> bool;
    fn enter_raw(&mut self) -> io::Result<RawModeGuard>;
    /// Repaint the whole prompt frame.
    fn draw(&mut self, lines: Vec<Line<'static>>, height: u16) -> io::Result<()>;
    /// Erase the frame once the prompt has resolved.
    fn clear(&mut self) -> io::Result<()>;
    fn read_key(&mut self) -> io::Result<Key>;
    /// One line of cooked input without its line terminator; `None` at end of input.
    fn read_line(&mut self, label: &str) -> io::Result<Option<String>>;
    fn print(&mut self, line: &str) -> io::Result<()>;
}

/// The real terminal: crossterm events in, an inline ratatui viewport out.
pub struct TerminalIo {
    interactive: bool,
    viewport: Option<Terminal<CrosstermBackend<Stdout>>>,
}

impl TerminalIo {
    pub fn new() -> Self {
        TerminalIo {
            interactive: io::stdin().is_terminal(),
            viewport: None,
        }
    }
}

impl Default for TerminalIo {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptIo for TerminalIo {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn enter_raw(&mut self) -> io::Result<RawModeGuard> {
        RawModeGuard::acquire()
    }

    fn draw(&mut self, lines: Vec<Line<'static>>, height: u16) -> io::Result<()> {
        if self.viewport.is_none() {
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::with_options(
                backend,
                TerminalOptions {
                    viewport: Viewport::Inline(height),
                },
            )?;
            self.viewport = Some(terminal);
        }
        if let Some(terminal) = self.viewport.as_mut() {
            terminal.draw(|f| f.render_widget(Paragraph::new(lines), f.area()))?;
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        if let Some(mut terminal) = self.viewport.take() {
            terminal.clear()?;
            terminal.show_cursor()?;
        }
        Ok(())
    }

    fn read_key(&mut self) -> io::Result<Key> {
        loop {
            if let Some(key) = Key::from_event(&event::read()?) {
                return Ok(key);
            }
        }
    }

    fn read_line(&mut self, label: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{label}: ")?;
        stdout.flush()?;

        let mut buf = String::new();
        if io::stdin().lock().read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(buf)))
    }

    fn print(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }
}

/// Drop the trailing `\n` or `\r\n`; everything else is kept as typed.
pub fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
