//! The five prompt primitives offered to the application loop.
//!
//! `Console` owns a `PromptIo` and runs one prompt at a time: it enters raw
//! mode, paints the frame, feeds keys through the `Prompt` state machine
//! until it resolves, erases the frame and lets the raw-mode guard go. When no
//! interactive terminal is attached the raw-mode primitives resolve at once
//! with their defaults and read nothing.

use tracing::debug;

use crate::error::PromptError;
use crate::tui::keys::Key;
use crate::tui::prompt::{Prompt, Resolution, Step};
use crate::tui::terminal::PromptIo;

/// Outcome of a single-select or confirm prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub accepted: bool,
}

impl Selection {
    /// The chosen index, if the prompt was accepted.
    pub fn chosen(self) -> Option<usize> {
        self.accepted.then_some(self.index)
    }
}

/// Outcome of a multi-select prompt. Indexes are ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSelection {
    pub indexes: Vec<usize>,
    pub accepted: bool,
}

pub struct Console<I: PromptIo> {
    io: I,
}

impl<I: PromptIo> Console<I> {
    pub fn new(io: I) -> Self {
        Console { io }
    }

    pub fn is_interactive(&self) -> bool {
        self.io.is_interactive()
    }

    pub fn into_inner(self) -> I {
        self.io
    }

    /// Choose one entry. Esc cancels. An empty list resolves cancelled.
    pub fn select<S: AsRef<str>>(&mut self, title: &str, options: &[S]) -> Result<Selection, PromptError> {
        if options.is_empty() {
            return Ok(Selection {
                index: 0,
                accepted: false,
            });
        }
        let prompt = Prompt::select(title, owned(options));
        match self.run(prompt)? {
            Resolution::Single { index, accepted } => Ok(Selection { index, accepted }),
            other => unreachable!("single-select resolved as {other:?}"),
        }
    }

    /// Mark any number of entries with Space; Enter confirms, Esc cancels.
    pub fn multi_select<S: AsRef<str>>(
        &mut self,
        title: &str,
        options: &[S],
    ) -> Result<MultiSelection, PromptError> {
        if options.is_empty() {
            return Ok(MultiSelection {
                indexes: Vec::new(),
                accepted: false,
            });
        }
        let prompt = Prompt::multi_select(title, owned(options));
        match self.run(prompt)? {
            Resolution::Multi { indexes, accepted } => Ok(MultiSelection { indexes, accepted }),
            other => unreachable!("multi-select resolved as {other:?}"),
        }
    }

    /// Two-way choice; accepted only when the first (`affirm`) option is chosen.
    pub fn confirm(&mut self, message: &str, affirm: &str, decline: &str) -> Result<Selection, PromptError> {
        match self.run(Prompt::confirm(message, affirm, decline))? {
            Resolution::Single { index, accepted } => Ok(Selection { index, accepted }),
            other => unreachable!("confirm resolved as {other:?}"),
        }
    }

    /// Wait for any key.
    pub fn pause(&mut self, message: &str) -> Result<(), PromptError> {
        self.run(Prompt::any_key(message)).map(|_| ())
    }

    /// Read one line of text as typed. End of input reads as an empty line.
    pub fn input(&mut self, label: &str) -> Result<String, PromptError> {
        Ok(self.io.read_line(label)?.unwrap_or_default())
    }

    pub fn print_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), PromptError> {
        for line in lines {
            self.io.print(line.as_ref())?;
        }
        Ok(())
    }

    /// Short inline message.
    pub fn message(&mut self, text: &str) -> Result<(), PromptError> {
        self.io.print(text)?;
        Ok(())
    }

    fn run(&mut self, mut prompt: Prompt) -> Result<Resolution, PromptError> {
        if !self.io.is_interactive() {
            let resolution = prompt.headless_resolution();
            debug!(mode = ?prompt.mode(), ?resolution, "no terminal, using default");
            return Ok(resolution);
        }

        let _raw = self.io.enter_raw()?;
        let outcome = self.drive(&mut prompt);
        let cleared = self.io.clear();
        let resolution = outcome?;
        cleared?;
        debug!(mode = ?prompt.mode(), ?resolution, "prompt resolved");
        Ok(resolution)
    }

    fn drive(&mut self, prompt: &mut Prompt) -> Result<Resolution, PromptError> {
        let height = prompt.height();
        self.io.draw(prompt.lines(), height)?;
        loop {
            let key = self.io.read_key()?;
            if key == Key::Interrupt {
                return Err(PromptError::Interrupted);
            }
            match prompt.handle(key) {
                Step::Redraw => self.io.draw(prompt.lines(), height)?,
                Step::Ignored => {}
                Step::Resolved(resolution) => return Ok(resolution),
            }
        }
    }
}

fn owned<S: AsRef<str>>(options: &[S]) -> Vec<String> {
    options.iter().map(|s| s.as_ref().to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedIo;
    use super::*;

    #[test]
    fn select_resolves_through_keys() {
        let io = ScriptedIo::interactive(&[Key::Down, Key::Down, Key::Up, Key::Enter], &[]);
        let mut console = Console::new(io);
        let picked = console.select("Pick", &["A", "B", "C"]).unwrap();
        assert_eq!(picked, Selection { index: 1, accepted: true });
        assert_eq!(picked.chosen(), Some(1));

        let io = console.into_inner();
        assert_eq!(io.raw_entries, 1);
        assert_eq!(io.clears, 1);
        // initial paint plus one repaint per cursor move
        assert_eq!(io.frames.len(), 4);
        assert_eq!(io.frames[0][1], "► A");
        assert_eq!(io.frames[3][2], "► B");
    }

    #[test]
    fn multi_select_collects_marks() {
        let io = ScriptedIo::interactive(&[Key::Space, Key::Down, Key::Space, Key::Enter], &[]);
        let mut console = Console::new(io);
        let picked = console.multi_select("Pick", &["A", "B", "C"]).unwrap();
        assert_eq!(
            picked,
            MultiSelection {
                indexes: vec![0, 1],
                accepted: true
            }
        );
    }

    #[test]
    fn confirm_and_pause() {
        let io = ScriptedIo::interactive(&[Key::Down, Key::Enter, Key::Char('x')], &[]);
        let mut console = Console::new(io);
        let answer = console.confirm("Delete?", "Delete", "Cancel").unwrap();
        assert!(!answer.accepted);
        console.pause("Done").unwrap();
        assert!(console.into_inner().keys.is_empty());
    }

    #[test]
    fn headless_prompts_consume_nothing() {
        let keys = [Key::Down, Key::Escape, Key::Enter];
        let io = ScriptedIo::headless(&keys, &[]);
        let mut console = Console::new(io);

        assert_eq!(
            console.select("Pick", &["A", "B"]).unwrap(),
            Selection { index: 0, accepted: true }
        );
        assert!(console.confirm("Sure?", "Yes", "No").unwrap().accepted);
        let multi = console.multi_select("Pick", &["A", "B"]).unwrap();
        assert!(multi.accepted);
        assert_eq!(multi.indexes, vec![0]);
        console.pause("Done").unwrap();

        let io = console.into_inner();
        assert_eq!(io.keys.len(), keys.len());
        assert_eq!(io.raw_entries, 0);
        assert!(io.frames.is_empty());
    }

    #[test]
    fn interrupt_still_clears_frame() {
        let io = ScriptedIo::interactive(&[Key::Down, Key::Interrupt, Key::Enter], &[]);
        let mut console = Console::new(io);
        let err = console.select("Pick", &["A", "B"]).unwrap_err();
        assert!(matches!(err, PromptError::Interrupted));
        let io = console.into_inner();
        assert_eq!(io.clears, 1);
        assert_eq!(io.keys.len(), 1);
    }

    #[test]
    fn exhausted_input_surfaces_io_error() {
        let io = ScriptedIo::interactive(&[Key::Down], &[]);
        let mut console = Console::new(io);
        let err = console.select("Pick", &["A", "B"]).unwrap_err();
        assert!(matches!(err, PromptError::Io(_)));
        assert_eq!(console.into_inner().clears, 1);
    }

    #[test]
    fn empty_option_lists_resolve_cancelled() {
        let io = ScriptedIo::interactive(&[], &[]);
        let mut console = Console::new(io);
        let empty: [&str; 0] = [];
        assert!(!console.select("Pick", &empty).unwrap().accepted);
        assert!(!console.multi_select("Pick", &empty).unwrap().accepted);
        assert_eq!(console.into_inner().raw_entries, 0);
    }

    #[test]
    fn input_keeps_text_untrimmed() {
        let io = ScriptedIo::headless(&[], &["  spaced out  "]);
        let mut console = Console::new(io);
        assert_eq!(console.input("Title").unwrap(), "  spaced out  ");
        assert_eq!(console.input("Title").unwrap(), "");
    }
}
