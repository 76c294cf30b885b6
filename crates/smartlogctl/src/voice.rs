//! Speech collaborators
//!
//! The engine only sees text. Whatever turns speech into a query and a reply
//! back into speech sits behind these two traits; the terminal versions read
//! stdin and print to stdout.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::{BufRead, IsTerminal, Write};

/// Source of operator queries
pub trait SpeechRecognizer {
    /// Next utterance. `Some("")` means nothing was understood;
    /// `None` means the input is closed.
    fn listen_and_recognize(&mut self) -> Option<String>;
}

/// Sink for replies
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Reads one line per utterance from any buffered reader
pub struct LineRecognizer<R: BufRead> {
    reader: R,
    prompt: Option<String>,
}

impl<R: BufRead> LineRecognizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }

    /// Print `prompt` on stdout before every read
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// Terminal recognizer over stdin
pub fn stdin_recognizer() -> LineRecognizer<std::io::StdinLock<'static>> {
    let recognizer = LineRecognizer::new(std::io::stdin().lock());
    if std::io::stdout().is_terminal() {
        recognizer.with_prompt(format!("{} ", "smartlog>".cyan().bold()))
    } else {
        recognizer
    }
}

impl<R: BufRead> SpeechRecognizer for LineRecognizer<R> {
    fn listen_and_recognize(&mut self) -> Option<String> {
        if let Some(prompt) = &self.prompt {
            print!("{}", prompt);
            let _ = std::io::stdout().flush();
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

/// Writes replies to any writer, one reply per block
pub struct TextSpeaker<W: Write> {
    writer: W,
    colored: bool,
}

impl<W: Write> TextSpeaker<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            colored: false,
        }
    }

    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Terminal speaker over stdout, coloured on a TTY
pub fn stdout_speaker() -> TextSpeaker<std::io::Stdout> {
    let colored = std::io::stdout().is_terminal();
    TextSpeaker::new(std::io::stdout()).colored(colored)
}

impl<W: Write> SpeechSynthesizer for TextSpeaker<W> {
    fn speak(&mut self, text: &str) -> Result<()> {
        if self.colored {
            writeln!(self.writer, "{}", text.green())
        } else {
            writeln!(self.writer, "{}", text)
        }
        .context("Failed to write reply")?;
        self.writer.flush().context("Failed to flush reply")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_line_recognizer() {
        let mut recognizer = LineRecognizer::new(Cursor::new("stok 105D\n\n  late  \n"));
        assert_eq!(recognizer.listen_and_recognize(), Some("stok 105D".to_string()));
        assert_eq!(recognizer.listen_and_recognize(), Some(String::new()));
        assert_eq!(recognizer.listen_and_recognize(), Some("late".to_string()));
        assert_eq!(recognizer.listen_and_recognize(), None);
    }

    #[test]
    fn test_text_speaker() {
        let mut speaker = TextSpeaker::new(Vec::new());
        speaker.speak("Ada 2 delivery yang sudah tiba.").unwrap();
        let out = String::from_utf8(speaker.into_inner()).unwrap();
        assert_eq!(out, "Ada 2 delivery yang sudah tiba.\n");
    }
}
