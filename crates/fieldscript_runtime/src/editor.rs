//! Terminal input for the REPL.
//!
//! [`Repl`](crate::Repl) reads through [`LineEditor`], so tests can script
//! its input. [`RustylineEditor`] is the interactive implementation, with
//! completion that knows each command's arguments.

use std::borrow::Cow;

use fieldscript_foundation::{Error, Result};
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator};

/// One read from the terminal.
#[derive(Debug)]
pub enum ReadResult {
    /// A full line.
    Line(String),
    /// Ctrl+C: drop the current line.
    Interrupted,
    /// Ctrl+D: end of input.
    Eof,
}

/// Source of REPL input lines.
pub trait LineEditor {
    /// Reads one line after showing `prompt`.
    ///
    /// # Errors
    ///
    /// Fails if the terminal cannot be read.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Remembers an entered line.
    fn add_history(&mut self, line: &str);

    /// Sets the command words completed in first position.
    fn set_keywords(&mut self, keywords: Vec<String>);
}

/// Fixed argument words for commands whose second word is a choice.
const ARGUMENTS: &[(&str, &[&str])] = &[
    ("peek", &["byte", "word", "long", "sbyte", "sword", "flag"]),
    ("poke", &["byte", "word", "long", "sbyte", "sword", "flag"]),
    ("notify", &["dialogue", "anim", "timer"]),
    ("trace", &["on", "off", "json", "human", "dump", "focus"]),
    ("cancel", &["all"]),
];

/// Commands whose argument is a path.
const PATH_COMMANDS: &[&str] = &["load", "save", "restore"];

#[derive(Helper, Completer, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Completer)]
    completer: ArgumentCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Highlighter for ReplHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;36m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }
}

/// Completes the word under the cursor from what precedes it.
struct ArgumentCompleter {
    commands: Vec<String>,
    paths: FilenameCompleter,
}

impl ArgumentCompleter {
    fn candidates<'a>(words: impl IntoIterator<Item = &'a str>, prefix: &str) -> Vec<Pair> {
        words
            .into_iter()
            .filter(|word| word.starts_with(prefix))
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect()
    }
}

impl Completer for ArgumentCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let start = before.rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let prefix = &before[start..];
        let previous: Vec<&str> = before[..start].split_whitespace().collect();

        let pairs = match previous.as_slice() {
            [] => Self::candidates(self.commands.iter().map(String::as_str), prefix),
            [command] if PATH_COMMANDS.contains(command) => {
                return self.paths.complete(line, pos, ctx);
            }
            [command] => ARGUMENTS
                .iter()
                .find(|(name, _)| name == command)
                .map(|(_, words)| Self::candidates(words.iter().copied(), prefix))
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok((start, pairs))
    }
}

/// Interactive editor backed by rustyline.
pub struct RustylineEditor {
    editor: Editor<ReplHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Opens the terminal editor.
    ///
    /// # Errors
    ///
    /// Fails if rustyline cannot set up the terminal.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .history_ignore_dups(true)
            .map_err(|e| Error::internal(e.to_string()))?
            .max_history_size(500)
            .map_err(|e| Error::internal(e.to_string()))?
            .build();

        let mut editor =
            Editor::with_config(config).map_err(|e| Error::internal(e.to_string()))?;
        editor.set_helper(Some(ReplHelper {
            completer: ArgumentCompleter {
                commands: Vec::new(),
                paths: FilenameCompleter::new(),
            },
            hinter: HistoryHinter::new(),
        }));
        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::internal(e.to_string())),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.commands = keywords;
        }
    }
}
