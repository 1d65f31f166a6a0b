//! The prompt state machine shared by every raw-mode primitive.
//!
//! A `Prompt` starts with the cursor on the first option and an empty
//! selection. Each key either changes that state (and the frame must be
//! repainted), is ignored, or resolves the prompt. Which keys are accepted and
//! what a resolution carries depend only on the `Mode`; rendering and the
//! raw-mode lifecycle live elsewhere and are shared.

use std::collections::BTreeSet;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::tui::colors::{ACCENT, DANGER, MUTED};
use crate::tui::keys::Key;

/// Options shown at once; longer lists scroll with the cursor.
pub const MAX_VISIBLE: usize = 12;

const CURSOR: &str = "► ";

/// Which primitive a prompt behaves as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Select,
    MultiSelect,
    /// Exactly two options; index 0 is the affirmative action.
    Confirm,
    AnyKey,
}

/// Terminal state of a prompt, consumed once by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Single { index: usize, accepted: bool },
    Multi { indexes: Vec<usize>, accepted: bool },
    Dismissed,
}

/// What handling one key did to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Redraw,
    Ignored,
    Resolved(Resolution),
}

#[derive(Debug, Clone)]
pub struct Prompt {
    mode: Mode,
    title: String,
    options: Vec<String>,
    active: usize,
    selected: BTreeSet<usize>,
}

impl Prompt {
    fn new(mode: Mode, title: impl Into<String>, options: Vec<String>) -> Self {
        Prompt {
            mode,
            title: title.into(),
            options,
            active: 0,
            selected: BTreeSet::new(),
        }
    }

    pub fn select(title: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(Mode::Select, title, options)
    }

    pub fn multi_select(title: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(Mode::MultiSelect, title, options)
    }

    pub fn confirm(message: impl Into<String>, affirm: impl Into<String>, decline: impl Into<String>) -> Self {
        Self::new(Mode::Confirm, message, vec![affirm.into(), decline.into()])
    }

    pub fn any_key(message: impl Into<String>) -> Self {
        Self::new(Mode::AnyKey, message, Vec::new())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    /// Feed one key through the state machine.
    pub fn handle(&mut self, key: Key) -> Step {
        if self.mode == Mode::AnyKey {
            return Step::Resolved(Resolution::Dismissed);
        }

        match key {
            Key::Up => self.move_to(self.active.saturating_sub(1)),
            Key::Down => self.move_to(self.active + 1),
            Key::Space if self.mode == Mode::MultiSelect => {
                if !self.selected.remove(&self.active) {
                    self.selected.insert(self.active);
                }
                Step::Redraw
            }
            Key::Enter => Step::Resolved(self.accept()),
            Key::Escape if self.mode != Mode::Confirm => Step::Resolved(self.cancel()),
            _ => Step::Ignored,
        }
    }

    /// Moves are clamped to the option range; there is no wraparound.
    fn move_to(&mut self, index: usize) -> Step {
        let clamped = index.min(self.options.len().saturating_sub(1));
        if clamped == self.active {
            return Step::Ignored;
        }
        self.active = clamped;
        Step::Redraw
    }

    fn accept(&self) -> Resolution {
        match self.mode {
            Mode::Select => Resolution::Single {
                index: self.active,
                accepted: true,
            },
            Mode::Confirm => Resolution::Single {
                index: self.active,
                accepted: self.active == 0,
            },
            Mode::MultiSelect => Resolution::Multi {
                indexes: self.selected(),
                accepted: true,
            },
            Mode::AnyKey => Resolution::Dismissed,
        }
    }

    fn cancel(&self) -> Resolution {
        match self.mode {
            Mode::MultiSelect => Resolution::Multi {
                indexes: Vec::new(),
                accepted: false,
            },
            Mode::AnyKey => Resolution::Dismissed,
            Mode::Select | Mode::Confirm => Resolution::Single {
                index: self.active,
                accepted: false,
            },
        }
    }

    /// Resolution used when no interactive terminal is attached: the first
    /// option chosen (or marked) and the prompt accepted.
    pub fn headless_resolution(&self) -> Resolution {
        match self.mode {
            Mode::Select | Mode::Confirm => Resolution::Single {
                index: 0,
                accepted: true,
            },
            Mode::MultiSelect => Resolution::Multi {
                indexes: if self.options.is_empty() { Vec::new() } else { vec![0] },
                accepted: true,
            },
            Mode::AnyKey => Resolution::Dismissed,
        }
    }

    /// Range of option indexes currently on screen.
    fn window(&self) -> std::ops::Range<usize> {
        let len = self.options.len();
        if len <= MAX_VISIBLE {
            return 0..len;
        }
        let start = self.active.saturating_sub(MAX_VISIBLE / 2).min(len - MAX_VISIBLE);
        start..start + MAX_VISIBLE
    }

    /// Rows the frame occupies; constant for the life of the prompt.
    pub fn height(&self) -> u16 {
        let rows = self.options.len().min(MAX_VISIBLE);
        // title + options + blank + footer
        (rows + 3) as u16
    }

    /// Paint the full frame: title, one row per visible option, footer hint.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            self.title.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))];

        for index in self.window() {
            lines.push(self.option_line(index));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(self.footer(), Style::default().fg(MUTED))));
        lines
    }

    fn option_line(&self, index: usize) -> Line<'static> {
        let is_active = index == self.active;
        let pointer = if is_active { CURSOR } else { "  " };
        let marker = match self.mode {
            Mode::MultiSelect if self.selected.contains(&index) => "[x] ",
            Mode::MultiSelect => "[ ] ",
            _ => "",
        };

        let mut style = Style::default();
        if self.mode == Mode::Confirm && index == 0 {
            style = style.fg(DANGER).add_modifier(Modifier::BOLD);
        }
        if is_active {
            style = style.bg(Color::Gray).fg(Color::Black);
        }

        Line::from(vec![
            Span::raw(pointer),
            Span::styled(format!("{}{}", marker, self.options[index]), style),
        ])
    }

    fn footer(&self) -> String {
        let hint = match self.mode {
            Mode::Select => "Use ↑↓ to navigate, Enter to select, Esc to go back",
            Mode::MultiSelect => "Use ↑↓ to navigate, Space to mark, Enter to confirm, Esc to cancel",
            Mode::Confirm => "Use ↑↓ to choose, Enter to confirm",
            Mode::AnyKey => "Press any key to continue",
        };
        if self.options.len() > MAX_VISIBLE {
            format!("{} ({}/{})", hint, self.active + 1, self.options.len())
        } else {
            hint.to_string()
        }
    }
}
