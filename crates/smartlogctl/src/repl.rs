//! REPL - conversational loop over the query engine
//!
//! Listen, answer, speak, until the operator says goodbye or input closes.

use anyhow::Result;
use smartlog_common::formatter::{DATA_UNAVAILABLE, SYSTEM_ERROR};
use smartlog_common::QueryEngine;
use std::time::Instant;
use tracing::debug;

use crate::logging::Transcript;
use crate::voice::{SpeechRecognizer, SpeechSynthesizer};

pub const GREETING: &str = "SmartLog siap. Tanyakan stok Kanban atau status delivery.";
pub const FAREWELL: &str = "Sampai jumpa.";
pub const CONTEXT_CLEARED: &str = "Konteks percakapan dihapus.";
pub const HELP: &str = "Contoh pertanyaan:\n\
- stok kanban 105D\n\
- supplier nya siapa?\n\
- berapa yang terlambat\n\
- rute apa saja\n\
- kapan kedatangan route RC16-02\n\
Ketik 'reset' untuk menghapus konteks, 'keluar' untuk berhenti.";

const EXIT_WORDS: &[&str] = &["keluar", "exit", "quit", "bye"];

/// What one line of input asks the loop to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Skip,
    Exit,
    Reset,
    Help,
    Query(String),
}

impl ReplCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ReplCommand::Skip;
        }

        let lower = trimmed.to_lowercase();
        let word = lower.trim_start_matches(':');
        if EXIT_WORDS.contains(&word) {
            ReplCommand::Exit
        } else if word == "reset" {
            ReplCommand::Reset
        } else if word == "help" || word == "bantuan" {
            ReplCommand::Help
        } else {
            ReplCommand::Query(trimmed.to_string())
        }
    }
}

/// Counters reported when the loop ends
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub queries: usize,
    pub degraded: usize,
}

/// Run until an exit word or end of input
pub fn run_repl<R, S>(
    engine: &QueryEngine,
    recognizer: &mut R,
    speaker: &mut S,
    transcript: &Transcript,
) -> Result<SessionStats>
where
    R: SpeechRecognizer + ?Sized,
    S: SpeechSynthesizer + ?Sized,
{
    let mut stats = SessionStats::default();
    speaker.speak(GREETING)?;

    while let Some(input) = recognizer.listen_and_recognize() {
        match ReplCommand::parse(&input) {
            ReplCommand::Skip => continue,
            ReplCommand::Exit => break,
            ReplCommand::Reset => {
                engine.reset_context();
                speaker.speak(CONTEXT_CLEARED)?;
            }
            ReplCommand::Help => speaker.speak(HELP)?,
            ReplCommand::Query(text) => {
                let reply = answer(engine, &text, transcript);
                stats.queries += 1;
                if is_degraded(&reply) {
                    stats.degraded += 1;
                }
                speaker.speak(&reply)?;
            }
        }
    }

    speaker.speak(FAREWELL)?;
    debug!("REPL ended after {} queries", stats.queries);
    Ok(stats)
}

/// Answer one query and append it to the transcript
pub fn answer(engine: &QueryEngine, text: &str, transcript: &Transcript) -> String {
    let started = Instant::now();
    let reply = engine.process_query(text);
    transcript.record(text, &reply, started.elapsed(), !is_degraded(&reply));
    reply
}

pub fn is_degraded(reply: &str) -> bool {
    reply == DATA_UNAVAILABLE || reply == SYSTEM_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smartlog_common::{FakeTransport, RoutedFakeTransport, SmartlogConfig};
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct Scripted(VecDeque<String>);

    impl Scripted {
        fn new(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| l.to_string()).collect())
        }
    }

    impl SpeechRecognizer for Scripted {
        fn listen_and_recognize(&mut self) -> Option<String> {
            self.0.pop_front()
        }
    }

    #[derive(Default)]
    struct Collected(Vec<String>);

    impl SpeechSynthesizer for Collected {
        fn speak(&mut self, text: &str) -> Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    fn engine() -> QueryEngine {
        let config = SmartlogConfig::default();
        let transport = RoutedFakeTransport::new()
            .route(
                config.parts.url.clone(),
                FakeTransport::always(json!({"data": [
                    {"KanbanNo": "105D", "PartName": "AIR CLEANER ASSY",
                     "SupplierName": "SUGITY", "StockOverall": "248"}
                ]})),
            )
            .route(
                config.delivery.url.clone(),
                FakeTransport::always(json!({"data": [
                    ["43", "SUGITY", "RC17-01", "1", "", "08:00", "08:30", "", "late"]
                ]})),
            );
        QueryEngine::new(config, Arc::new(transport))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Skip);
        assert_eq!(ReplCommand::parse("Keluar"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse(":quit"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse(":reset"), ReplCommand::Reset);
        assert_eq!(ReplCommand::parse("help"), ReplCommand::Help);
        assert_eq!(
            ReplCommand::parse(" stok 105D "),
            ReplCommand::Query("stok 105D".to_string())
        );
    }

    #[test]
    fn test_conversation_until_exit() {
        let engine = engine();
        let mut recognizer =
            Scripted::new(&["stok 105D", "", "berapa yang late", "keluar", "stok 105D"]);
        let mut speaker = Collected::default();

        let transcript = Transcript::disabled();
        let stats = run_repl(&engine, &mut recognizer, &mut speaker, &transcript).unwrap();

        assert_eq!(stats.queries, 2);
        assert_eq!(stats.degraded, 0);
        assert_eq!(speaker.0.first().map(String::as_str), Some(GREETING));
        assert!(speaker.0[1].contains("248"));
        assert!(speaker.0[2].contains("Late"));
        assert_eq!(speaker.0.last().map(String::as_str), Some(FAREWELL));
        assert_eq!(speaker.0.len(), 4);
    }

    #[test]
    fn test_reset_clears_context() {
        let engine = engine();
        let mut recognizer = Scripted::new(&["stok 105D", "reset"]);
        let mut speaker = Collected::default();

        run_repl(&engine, &mut recognizer, &mut speaker, &Transcript::disabled()).unwrap();

        assert!(speaker.0.contains(&CONTEXT_CLEARED.to_string()));
        assert!(engine.context_snapshot().is_empty());
    }

    #[test]
    fn test_transcript_records_queries_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.jsonl");
        let engine = engine();
        let mut recognizer = Scripted::new(&["help", "stok 105D"]);
        let mut speaker = Collected::default();

        run_repl(&engine, &mut recognizer, &mut speaker, &Transcript::to_path(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("stok 105D"));
    }
}
