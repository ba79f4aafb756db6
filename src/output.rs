use std::io::{self, Write};
use std::sync::Mutex;

use serde::Serialize;

use crate::app::{LoadEvent, ProgressSink};
use crate::domain::{HistoryEntry, SearchResult, iso_timestamp};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_search(result: &SearchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_history(entries: &[HistoryEntry]) -> io::Result<()> {
        Self::print_json(&entries)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: LoadEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_search(result: &SearchResult) {
        println!("{CYAN}{}{RESET}", result.title);
        if result.is_empty() {
            println!("{YELLOW}No definitions found{RESET}");
            return;
        }
        for (index, row) in result.rows.iter().enumerate() {
            println!("{}) {GREEN}{}.{RESET} {}", index + 1, row.part_of_speech, row.gloss);
        }
    }

    pub fn print_history(entries: &[HistoryEntry]) {
        if entries.is_empty() {
            println!("{YELLOW}No recent searches{RESET}");
            return;
        }
        println!("{CYAN}Recent searches{RESET}");
        for (index, entry) in entries.iter().enumerate() {
            println!(
                "{:>3}  {GREEN}{}{RESET}  {}",
                index + 1,
                entry.word,
                iso_timestamp(&entry.timestamp)
            );
        }
    }
}

/// Renders load progress as a single rewritten line on stderr. Only whole
/// percent changes are redrawn.
#[derive(Default)]
pub struct StderrProgress {
    last_percent: Mutex<Option<u32>>,
}

impl StderrProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for StderrProgress {
    fn event(&self, event: LoadEvent) {
        let mut stderr = io::stderr();
        match event {
            LoadEvent::Progress(state) => {
                let percent = state.percent.round() as u32;
                let mut last = self
                    .last_percent
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if *last == Some(percent) {
                    return;
                }
                *last = Some(percent);
                let _ = write!(stderr, "\rLoading dictionary... {percent:>3}%");
                let _ = stderr.flush();
            }
            LoadEvent::Ready { rows, .. } => {
                let _ = writeln!(stderr, "\rDictionary loaded ({rows} entries).   ");
            }
            LoadEvent::Failed { message } => {
                let _ = writeln!(stderr, "\rError loading dictionary: {message}");
            }
        }
    }
}
