//! Game event logger
//!
//! Messages go to stdout, to an in-memory buffer, or both. Formatting of
//! decorated lines happens in a bump arena that is reset on every flush.

use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// How much of the game to report
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output during game
    Silent = 0,
    /// Minimal - only game outcome
    Minimal = 1,
    /// Normal - turns, steps, and key actions (default)
    #[default]
    Normal = 2,
    /// Verbose - all actions and state changes
    Verbose = 3,
}

impl std::str::FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityLevel::Silent),
            "minimal" | "1" => Ok(VerbosityLevel::Minimal),
            "normal" | "2" => Ok(VerbosityLevel::Normal),
            "verbose" | "3" => Ok(VerbosityLevel::Verbose),
            other => Err(format!("unknown verbosity level: {other}")),
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A captured log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// e.g. "stack", "combat", "selection"
    pub category: Option<String>,
    /// Turn number when the entry was written
    pub turn: u32,
}

/// Read-only view of the captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl LogGuard<'_> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl Deref for LogGuard<'_> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Centralized game logger
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    turn: u32,

    /// Scratch arena for decorated lines, reset on clear
    format_bump: RefCell<Bump>,

    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            turn: 0,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory only
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Stamp subsequent entries with this turn number
    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
        self.format_bump.borrow_mut().reset();
    }

    /// Print buffered entries the verbosity allows, then clear the buffer
    pub fn flush_buffer(&mut self) {
        {
            let buffer = self.log_buffer.borrow();
            for entry in buffer.iter().filter(|e| e.level <= self.verbosity) {
                self.print_entry(entry);
            }
        }
        self.clear_logs();
    }

    /// Log at Minimal level
    #[inline]
    pub fn minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, None, message);
    }

    /// Log at Normal level
    #[inline]
    pub fn normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, None, message);
    }

    /// Log at Verbose level
    #[inline]
    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, None, message);
    }

    /// Log a categorized game event
    #[inline]
    pub fn event(&self, level: VerbosityLevel, category: &str, message: &str) {
        self.log(level, Some(category), message);
    }

    /// Log a controller decision at Normal level
    pub fn controller_choice(&self, controller_name: &str, message: &str) {
        if !self.wants(VerbosityLevel::Normal) {
            return;
        }
        let bump = self.format_bump.borrow();
        let line = bumpalo::format!(in &bump, "{} chose {}", controller_name, message);
        self.log(VerbosityLevel::Normal, Some("controller_choice"), line.as_str());
    }

    fn wants(&self, level: VerbosityLevel) -> bool {
        level <= self.verbosity || self.is_capturing()
    }

    fn log(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        if level == VerbosityLevel::Silent || !self.wants(level) {
            return;
        }
        let entry = LogEntry {
            level,
            message: message.to_string(),
            category: category.map(str::to_string),
            turn: self.turn,
        };
        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
            && level <= self.verbosity
        {
            self.print_entry(&entry);
        }
        if self.is_capturing() {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    fn print_entry(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("failed to encode log entry: {e}"),
            },
            OutputFormat::Text => {
                if entry.level == VerbosityLevel::Minimal {
                    println!("{}", entry.message);
                } else {
                    let bump = self.format_bump.borrow();
                    let line = match &entry.category {
                        Some(category) => {
                            bumpalo::format!(in &bump, "  [{}] {}", category, entry.message)
                        }
                        None => bumpalo::format!(in &bump, "  {}", entry.message),
                    };
                    println!("{}", line.as_str());
                }
            }
        }
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = GameLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_log_capture() {
        let mut logger = GameLogger::new();
        logger.enable_capture();

        logger.normal("test message");
        logger.minimal("minimal message");
        logger.event(VerbosityLevel::Verbose, "stack", "resolved");

        let logs = logger.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "test message");
        assert_eq!(logs[1].message, "minimal message");
        assert_eq!(logs[2].category.as_deref(), Some("stack"));
    }

    #[test]
    fn test_silent_is_never_captured() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Silent);
        logger.enable_capture();
        logger.event(VerbosityLevel::Silent, "x", "nothing");
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_controller_choice_and_turn_stamp() {
        let mut logger = GameLogger::new();
        logger.enable_capture();
        logger.set_turn(4);
        logger.controller_choice("Alice", "Lightning Bolt");

        let logs = logger.logs();
        assert_eq!(logs[0].message, "Alice chose Lightning Bolt");
        assert_eq!(logs[0].turn, 4);
    }

    #[test]
    fn test_flush_buffer_clears() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Silent);
        logger.enable_capture();
        logger.normal("message 1");
        assert_eq!(logger.logs().len(), 1);
        logger.flush_buffer();
        assert_eq!(logger.logs().len(), 0);
    }

    #[test]
    fn test_verbosity_from_str() {
        assert_eq!("verbose".parse::<VerbosityLevel>(), Ok(VerbosityLevel::Verbose));
        assert_eq!("0".parse::<VerbosityLevel>(), Ok(VerbosityLevel::Silent));
        assert!("loud".parse::<VerbosityLevel>().is_err());
    }
}
