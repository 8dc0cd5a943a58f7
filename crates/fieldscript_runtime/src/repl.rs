//! The interactive command loop.
//!
//! Each line is one command. Commands are parsed into [`Command`] and run
//! against a [`Session`]; output comes back as text so the loop can be
//! driven from tests and batch files as well as a terminal.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use fieldscript_debug::{TraceFormat, TraceOutput};
use fieldscript_engine::{ExecState, InstanceId, SchedulerEvent, TickReport, WaitEvent};
use fieldscript_foundation::{EntityId, Error, ErrorKind, Result, VarBank};
use fieldscript_language::opcode::codes;
use fieldscript_language::{BinaryOp, ScriptWriter};

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::serialize;
use crate::session::Session;

/// Command words offered for completion.
const COMMANDS: &[&str] = &[
    "load", "entity", "spawn", "tick", "notify", "resume", "cancel", "ps", "disasm", "peek",
    "poke", "flag", "save", "restore", "trace", "help", "quit",
];

// =============================================================================
// Commands
// =============================================================================

/// What to do with the trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceCommand {
    /// Start recording and echoing to stderr.
    On,
    /// Stop recording.
    Off,
    /// Switch output to JSON.
    Json,
    /// Switch output to human-readable text.
    Human,
    /// Print the most recent records.
    Dump(usize),
    /// Follow one instance, or all with `None`.
    Focus(Option<u64>),
}

/// One parsed REPL line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Load a script file, optionally under another name.
    Load {
        /// File to read.
        path: String,
        /// Registered name, defaulting to the file stem.
        name: Option<String>,
    },
    /// Create an entity.
    Entity(String),
    /// Start an instance.
    Spawn {
        /// Script name.
        script: String,
        /// Owner by name or slot.
        owner: String,
    },
    /// Run frames.
    Tick(u64),
    /// Deliver a host event.
    Notify(NotifyCommand),
    /// Release a suspended instance.
    Resume(u64),
    /// Remove one instance, or all of them.
    Cancel(Option<u64>),
    /// List instances.
    Ps,
    /// Show a script listing.
    Disasm(String),
    /// Read a variable.
    Peek(VarBank, u16),
    /// Write a variable.
    Poke(VarBank, u16, i32),
    /// Read or write a flag.
    Flag(u16, Option<bool>),
    /// Save a snapshot.
    Save(String),
    /// Restore a snapshot.
    Restore(String),
    /// Control tracing.
    Trace(TraceCommand),
    /// Show help.
    Help,
    /// Leave the REPL.
    Quit,
}

/// A host event named on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifyCommand {
    /// `notify dialogue <channel>`
    Dialogue(i32),
    /// `notify anim <entity> <animation>`
    Animation(String, u16),
    /// `notify timer <instance>`
    Timer(u64),
}

fn usage(text: &str) -> Error {
    Error::internal(format!("usage: {text}"))
}

fn number<T: std::str::FromStr>(word: Option<&str>, text: &str) -> Result<T> {
    word.and_then(|w| parse_number(w).ok())
        .ok_or_else(|| usage(text))
}

/// Parses a decimal or `0x` hexadecimal number.
fn parse_number<T: std::str::FromStr>(word: &str) -> std::result::Result<T, ()> {
    if let Some(hex) = word.strip_prefix("0x") {
        let value = i64::from_str_radix(hex, 16).map_err(|_| ())?;
        return value.to_string().parse().map_err(|_| ());
    }
    word.parse().map_err(|_| ())
}

fn bank(word: Option<&str>, text: &str) -> Result<VarBank> {
    word.and_then(VarBank::from_name).ok_or_else(|| usage(text))
}

fn text(word: Option<&str>, usage_text: &str) -> Result<String> {
    word.map(str::to_string).ok_or_else(|| usage(usage_text))
}

impl Command {
    /// Parses one line. Returns `None` for blank lines and comments.
    ///
    /// # Errors
    ///
    /// Fails on unknown commands or malformed arguments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };

        let command = match head {
            "load" => Self::Load {
                path: text(words.next(), "load <path> [name]")?,
                name: words.next().map(str::to_string),
            },
            "entity" => Self::Entity(text(words.next(), "entity <name>")?),
            "spawn" => Self::Spawn {
                script: text(words.next(), "spawn <script> <entity>")?,
                owner: text(words.next(), "spawn <script> <entity>")?,
            },
            "tick" => match words.next() {
                Some(n) => Self::Tick(number(Some(n), "tick [count]")?),
                None => Self::Tick(1),
            },
            "notify" => Self::Notify(Self::parse_notify(&mut words)?),
            "resume" => Self::Resume(number(words.next(), "resume <instance>")?),
            "cancel" => match words.next() {
                Some("all") => Self::Cancel(None),
                word => Self::Cancel(Some(number(word, "cancel <instance>|all")?)),
            },
            "ps" => Self::Ps,
            "disasm" => Self::Disasm(text(words.next(), "disasm <script>")?),
            "peek" => {
                let u = "peek <bank> <index>";
                Self::Peek(bank(words.next(), u)?, number(words.next(), u)?)
            }
            "poke" => {
                let u = "poke <bank> <index> <value>";
                Self::Poke(
                    bank(words.next(), u)?,
                    number(words.next(), u)?,
                    number(words.next(), u)?,
                )
            }
            "flag" => {
                let u = "flag <index> [on|off]";
                let index = number(words.next(), u)?;
                let value = match words.next() {
                    None => None,
                    Some("on" | "1") => Some(true),
                    Some("off" | "0") => Some(false),
                    Some(_) => return Err(usage(u)),
                };
                Self::Flag(index, value)
            }
            "save" => Self::Save(text(words.next(), "save <path>")?),
            "restore" => Self::Restore(text(words.next(), "restore <path>")?),
            "trace" => Self::Trace(match words.next() {
                Some("on") => TraceCommand::On,
                Some("off") => TraceCommand::Off,
                Some("json") => TraceCommand::Json,
                Some("human") => TraceCommand::Human,
                Some("dump") => match words.next() {
                    Some(n) => TraceCommand::Dump(number(Some(n), "trace dump [count]")?),
                    None => TraceCommand::Dump(20),
                },
                Some("focus") => match words.next() {
                    Some("all") => TraceCommand::Focus(None),
                    word => TraceCommand::Focus(Some(number(word, "trace focus <instance>|all")?)),
                },
                _ => return Err(usage("trace on|off|json|human|dump [count]|focus <instance>|all")),
            }),
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => {
                return Err(Error::internal(format!(
                    "unknown command '{other}' (try 'help')"
                )));
            }
        };
        Ok(Some(command))
    }

    fn parse_notify<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<NotifyCommand> {
        let u = "notify dialogue <channel> | anim <entity> <animation> | timer <instance>";
        match words.next() {
            Some("dialogue") => Ok(NotifyCommand::Dialogue(number(words.next(), u)?)),
            Some("anim") => Ok(NotifyCommand::Animation(
                text(words.next(), u)?,
                number(words.next(), u)?,
            )),
            Some("timer") => Ok(NotifyCommand::Timer(number(words.next(), u)?)),
            _ => Err(usage(u)),
        }
    }
}

// =============================================================================
// REPL
// =============================================================================

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session the commands act on.
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(mut editor: E) -> Self {
        editor.set_keywords(COMMANDS.iter().map(ToString::to_string).collect());
        Self {
            editor,
            session: Session::default(),
            show_banner: true,
            prompt: "field> ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            Self::print_banner();
        }

        loop {
            let line = match self.editor.read_line(&self.prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => {
                    println!();
                    continue;
                }
                ReadResult::Eof => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            self.editor.add_history(&line);

            match self.eval(&line) {
                Ok(Some(output)) => {
                    if !output.is_empty() {
                        println!("{output}");
                    }
                }
                Ok(None) => break,
                Err(e) => Self::print_error(&e),
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Runs one line. Returns `None` when the line asks to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not parse or the command fails.
    pub fn eval(&mut self, line: &str) -> Result<Option<String>> {
        match Command::parse(line)? {
            None => Ok(Some(String::new())),
            Some(Command::Quit) => Ok(None),
            Some(command) => self.execute(command).map(Some),
        }
    }

    /// Runs every line of a command file, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a command fails.
    pub fn eval_file(&mut self, path: &Path) -> Result<String> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::IoError(format!(
                "failed to read '{}': {e}",
                path.display()
            )))
        })?;
        let mut output = String::new();
        for line in contents.lines() {
            match self.eval(line)? {
                Some(text) if !text.is_empty() => {
                    output.push_str(&text);
                    output.push('\n');
                }
                Some(_) => {}
                None => break,
            }
        }
        Ok(output)
    }

    /// Runs a parsed command and returns its output.
    ///
    /// # Errors
    ///
    /// Returns whatever error the session reports.
    pub fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Load { path, name } => {
                let program = match name {
                    Some(name) => {
                        let bytes = fs::read(&path).map_err(|e| {
                            Error::new(ErrorKind::IoError(format!(
                                "failed to read script '{path}': {e}"
                            )))
                        })?;
                        self.session.load_script(name, bytes)?
                    }
                    None => self.session.load_script_file(&path)?,
                };
                Ok(format!(
                    "loaded {} ({} instructions)",
                    program.name(),
                    program.len()
                ))
            }
            Command::Entity(name) => {
                let id = self.session.create_entity(name.clone());
                Ok(format!("{id} {name}"))
            }
            Command::Spawn { script, owner } => {
                let owner = self.resolve_entity(&owner)?;
                let id = self.session.spawn(&script, owner)?;
                Ok(format!("spawned {id}"))
            }
            Command::Tick(count) => {
                let mut output = String::new();
                for report in self.session.run(count) {
                    if !output.is_empty() {
                        output.push('\n');
                    }
                    output.push_str(&Self::summarize(&report));
                }
                Ok(output)
            }
            Command::Notify(notify) => {
                let event = match notify {
                    NotifyCommand::Dialogue(channel) => WaitEvent::DialogueClosed { channel },
                    NotifyCommand::Animation(entity, animation) => WaitEvent::AnimationFinished {
                        entity: self.resolve_entity(&entity)?,
                        animation,
                    },
                    NotifyCommand::Timer(id) => WaitEvent::TimerElapsed {
                        instance: InstanceId(id),
                    },
                };
                let released = self.session.notify(&event);
                Ok(format!("{event}: released {}", Self::id_list(&released)))
            }
            Command::Resume(id) => {
                self.session.resume(InstanceId(id))?;
                Ok(format!("resumed #{id}"))
            }
            Command::Cancel(Some(id)) => {
                self.session.cancel(InstanceId(id))?;
                Ok(format!("cancelled #{id}"))
            }
            Command::Cancel(None) => {
                let count = self.session.cancel_all();
                Ok(format!("cancelled {count} instance(s)"))
            }
            Command::Ps => Ok(self.process_list()),
            Command::Disasm(script) => {
                let listing = self.session.disassemble(&script)?;
                Ok(listing.trim_end().to_string())
            }
            Command::Peek(bank, index) => {
                let value = self.session.field().read(bank, index)?;
                Ok(format!("{bank}[{index}] = {value}"))
            }
            Command::Poke(bank, index, value) => {
                self.session.field_mut().write(bank, index, value)?;
                Ok(format!("{bank}[{index}] <- {value}"))
            }
            Command::Flag(index, None) => {
                let value = self.session.field().flag(index)?;
                Ok(format!("flag[{index}] = {value}"))
            }
            Command::Flag(index, Some(value)) => {
                self.session.field_mut().set_flag(index, value)?;
                Ok(format!("flag[{index}] <- {value}"))
            }
            Command::Save(path) => {
                serialize::save_to_file(&self.session.snapshot(), &path)?;
                Ok(format!("saved to {path}"))
            }
            Command::Restore(path) => {
                let snapshot = serialize::load_from_file(&path)?;
                self.session.restore(snapshot)?;
                Ok(format!("restored from {path}"))
            }
            Command::Trace(trace) => Ok(self.trace(trace)),
            Command::Help => Ok(HELP.trim_end().to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    /// Looks an entity up by name, then by slot number.
    fn resolve_entity(&self, word: &str) -> Result<EntityId> {
        if let Some(id) = self.session.find_entity(word) {
            return Ok(id);
        }
        let slot: u32 = word
            .trim_start_matches("entity#")
            .parse()
            .map_err(|_| Error::internal(format!("no entity named '{word}'")))?;
        self.session
            .field()
            .entities()
            .iter()
            .map(|(id, _)| id)
            .find(|id| id.slot == slot)
            .ok_or_else(|| Error::internal(format!("no live entity in slot {slot}")))
    }

    fn trace(&mut self, command: TraceCommand) -> String {
        match command {
            TraceCommand::On => {
                self.session.set_tracing(true);
                self.session
                    .tracer_mut()
                    .set_output(TraceOutput::Stderr);
                "tracing on".to_string()
            }
            TraceCommand::Off => {
                self.session.set_tracing(false);
                "tracing off".to_string()
            }
            TraceCommand::Json => {
                self.session.tracer_mut().set_format(TraceFormat::Json);
                "trace format: json".to_string()
            }
            TraceCommand::Human => {
                self.session.tracer_mut().set_format(TraceFormat::Human);
                "trace format: human".to_string()
            }
            TraceCommand::Focus(Some(id)) => {
                self.session.tracer_mut().set_focus(Some(InstanceId(id)));
                format!("tracing #{id} only")
            }
            TraceCommand::Focus(None) => {
                self.session.tracer_mut().set_focus(None);
                "tracing all instances".to_string()
            }
            TraceCommand::Dump(count) => {
                let tracer = self.session.tracer();
                let records = tracer.buffer().recent(count);
                if records.is_empty() {
                    "trace buffer is empty".to_string()
                } else {
                    tracer.format_records(&records)
                }
            }
        }
    }

    fn process_list(&self) -> String {
        let scheduler = self.session.scheduler();
        if scheduler.is_empty() {
            return "no instances".to_string();
        }
        let mut output = String::from("ID    SCRIPT            OWNER        PC    STATE");
        for instance in scheduler.instances() {
            let state = match instance.state() {
                ExecState::Suspended(reason) => match self.session.timer_deadline(instance.id()) {
                    Some(tick) => format!("waiting {reason} until tick {tick}"),
                    None => format!("waiting {reason}"),
                },
                other => other.to_string(),
            };
            let _ = write!(
                output,
                "\n{:<5} {:<17} {:<12} {:<5} {state}",
                instance.id().to_string(),
                instance.program().name(),
                instance.owner().to_string(),
                instance.cursor().pc(),
            );
        }
        output
    }

    fn summarize(report: &TickReport) -> String {
        let mut line = format!("tick {}: {} executed", report.tick, report.executed);
        for event in &report.events {
            match event {
                SchedulerEvent::Halted { instance } => {
                    let _ = write!(line, ", {instance} halted");
                }
                SchedulerEvent::Faulted { instance, fault } => {
                    let _ = write!(line, ", {instance} faulted: {fault}");
                }
                SchedulerEvent::Suspended { instance, reason } => {
                    let _ = write!(line, ", {instance} waits {reason}");
                }
                SchedulerEvent::Executed { .. } | SchedulerEvent::QuotaExhausted { .. } => {}
            }
        }
        line
    }

    fn id_list(ids: &[InstanceId]) -> String {
        if ids.is_empty() {
            return "none".to_string();
        }
        ids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn print_error(error: &Error) {
        match &error.context {
            Some(context) => eprintln!("\x1b[31mError: {error} ({context})\x1b[0m"),
            None => eprintln!("\x1b[31mError: {error}\x1b[0m"),
        }
    }

    fn print_banner() {
        println!("\x1b[1mFieldscript\x1b[0m {}", env!("CARGO_PKG_VERSION"));
        println!("Type 'help' for commands, Ctrl+D to exit.");
        println!();
    }
}

const HELP: &str = "\
load <path> [name]                 decode a script file and register it
entity <name>                      create an entity
spawn <script> <entity>            start an instance owned by an entity
tick [count]                       run frames
notify dialogue <channel>          close a message window
notify anim <entity> <animation>   finish an animation
notify timer <instance>            end an instance's timer early
resume <instance>                  release a suspended instance
cancel <instance>|all              remove instances
ps                                 list instances
disasm <script>                    show a script listing
peek <bank> <index>                read a variable (byte word long sbyte sword flag)
poke <bank> <index> <value>        write a variable
flag <index> [on|off]              read or write a flag
save <path> / restore <path>       snapshot the session
trace on|off|json|human|dump [n]   control tracing
trace focus <id>|all               follow one instance
help                               show this text
quit                               leave
";

// =============================================================================
// Demo
// =============================================================================

/// Assembles a small script that exercises the main instruction families.
///
/// It counts `byte[0]` up to 3, waiting one frame between steps, sets flag
/// 1, opens a message window on channel 0 and, once that closes, makes its
/// owner passable.
///
/// # Errors
///
/// Fails only if assembly fails.
pub fn demo_script() -> Result<Vec<u8>> {
    ScriptWriter::new()
        .label("loop")
        .push_var(VarBank::Byte, 0)
        .push_const(3)
        .binary(BinaryOp::Lt)
        .jpf("done")
        .push_var(VarBank::Byte, 0)
        .push_const(1)
        .binary(BinaryOp::Add)
        .op(codes::POPM_B, 0)
        .push_const(1)
        .op(codes::WAIT, 0)
        .jmp("loop")
        .label("done")
        .op(codes::BITON, 1)
        .push_const(0)
        .push_const(7)
        .op(codes::MESW, 0)
        .op(codes::THROUGHON, 0)
        .op(codes::HALT, 0)
        .finish()
}

// =============================================================================
// Tests
// =============================================================================
