//! Interactive and scripted front ends over the continuity engine.

use std::io::Write;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::models::Session;
use crate::session::{ContinuityEngine, TurnError, TurnMode, TurnOutcome};

const PROMPT: &str = "\n> ";

/// What a line typed at the prompt means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInput {
    Quit,
    History,
    Empty,
    Message(String),
}

impl ControlInput {
    /// Classify a raw input line. Commands match case-insensitively after trimming.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.to_lowercase().as_str() {
            "quit" | "exit" | "q" => Self::Quit,
            "history" => Self::History,
            _ => Self::Message(trimmed.to_string()),
        }
    }
}

/// Result of reading one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    Line(String),
    Eof,
    Interrupted,
}

/// Source of interactive input lines.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadLine>;
}

/// Terminal input with line editing and in-memory history.
pub struct TerminalLines {
    editor: DefaultEditor,
}

impl TerminalLines {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for TerminalLines {
    fn read_line(&mut self, prompt: &str) -> Result<ReadLine> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        tracing::debug!(error = %e, "failed to record line history");
                    }
                }
                Ok(ReadLine::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(ReadLine::Eof),
            Err(ReadlineError::Interrupted) => Ok(ReadLine::Interrupted),
            Err(e) => Err(e.into()),
        }
    }
}

/// Print every recorded turn with its artifact.
pub fn write_history(session: &Session, out: &mut impl Write) -> Result<()> {
    if session.history().is_empty() {
        writeln!(out, "No messages yet")?;
        return Ok(());
    }
    for (i, turn) in session.history().iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, turn.message)?;
        writeln!(out, "   -> {}", turn.artifact_path.display())?;
    }
    Ok(())
}

fn describe(mode: &TurnMode) -> String {
    match mode {
        TurnMode::Fresh => "new image".to_string(),
        TurnMode::Refine { reference } => format!("refined from {}", reference.display()),
    }
}

/// Print the outcome of a turn. Returns whether an artifact was produced.
pub fn report_turn(
    result: &Result<TurnOutcome, TurnError>,
    out: &mut impl Write,
) -> Result<bool> {
    match result {
        Ok(TurnOutcome::Produced { path, index, mode }) => {
            writeln!(out, "Image saved: {} (#{index}, {})", path.display(), describe(mode))?;
            Ok(true)
        }
        Ok(TurnOutcome::NoArtifact { mode }) => {
            writeln!(
                out,
                "No image in response ({}); try rewording the instruction",
                describe(mode)
            )?;
            Ok(false)
        }
        Err(e) => {
            tracing::error!(error = %e, "turn failed");
            writeln!(out, "Failed to generate image: {e}")?;
            Ok(false)
        }
    }
}

/// Run exactly one turn. Returns whether an artifact was produced.
pub async fn run_scripted(
    engine: &mut ContinuityEngine,
    message: &str,
    out: &mut impl Write,
) -> Result<bool> {
    writeln!(out, "Generating...")?;
    let result = engine.turn(message).await;
    report_turn(&result, out)
}

/// Read-evaluate loop until quit, end of input or interrupt.
pub async fn run_interactive(
    engine: &mut ContinuityEngine,
    input: &mut impl LineSource,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Multi-turn image generation session")?;
    writeln!(out, "Model: {}", engine.session().model())?;
    writeln!(out, "Output directory: {}", engine.session().output_dir().display())?;
    writeln!(out, "Type 'quit' or 'exit' to end the session")?;
    writeln!(out, "Type 'history' to see message history")?;
    writeln!(out, "{}", "-".repeat(40))?;
    out.flush()?;

    loop {
        let line = match input.read_line(PROMPT)? {
            ReadLine::Line(line) => line,
            ReadLine::Eof | ReadLine::Interrupted => {
                writeln!(out, "\nSession ended")?;
                break;
            }
        };

        match ControlInput::parse(&line) {
            ControlInput::Empty => continue,
            ControlInput::Quit => {
                writeln!(out, "Session ended")?;
                break;
            }
            ControlInput::History => write_history(engine.session(), out)?,
            ControlInput::Message(message) => {
                run_scripted(engine, &message, out).await?;
            }
        }
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use crate::gemini::fake::{FakeBackend, Reply};
    use crate::session::SessionStore;
    use tempfile::tempdir;

    struct ScriptedLines(VecDeque<ReadLine>);

    impl ScriptedLines {
        fn new(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| ReadLine::Line((*l).to_string())).collect())
        }

        fn then(mut self, end: ReadLine) -> Self {
            self.0.push_back(end);
            self
        }
    }

    impl LineSource for ScriptedLines {
        fn read_line(&mut self, _prompt: &str) -> Result<ReadLine> {
            Ok(self.0.pop_front().unwrap_or(ReadLine::Eof))
        }
    }

    fn engine_in(dir: &std::path::Path, backend: Arc<FakeBackend>) -> ContinuityEngine {
        let store = SessionStore::new(dir.join("session.json"));
        let session = ContinuityEngine::open_session(
            Some(&store),
            "gemini-2.5-flash-image",
            &dir.join("out"),
        )
        .unwrap();
        ContinuityEngine::new(session, Some(store), backend)
    }

    #[test]
    fn parses_control_inputs() {
        assert_eq!(ControlInput::parse("quit"), ControlInput::Quit);
        assert_eq!(ControlInput::parse("  EXIT "), ControlInput::Quit);
        assert_eq!(ControlInput::parse("Q"), ControlInput::Quit);
        assert_eq!(ControlInput::parse("History"), ControlInput::History);
        assert_eq!(ControlInput::parse("   "), ControlInput::Empty);
        assert_eq!(
            ControlInput::parse("  quit smoking "),
            ControlInput::Message("quit smoking".to_string())
        );
        assert_eq!(
            ControlInput::parse("show history"),
            ControlInput::Message("show history".to_string())
        );
    }

    #[tokio::test]
    async fn loop_dispatches_messages_and_quits() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut engine = engine_in(dir.path(), backend.clone());
        let mut input = ScriptedLines::new(&["a red circle", "", "make it blue", "quit", "ignored"]);
        let mut out = Vec::new();

        run_interactive(&mut engine, &mut input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(backend.call_count(), 2);
        assert!(text.contains("output_001.png"));
        assert!(text.contains("output_002.png"));
        assert!(text.contains("Session ended"));
        assert_eq!(engine.session().history().len(), 2);
    }

    #[tokio::test]
    async fn history_on_resumed_session_skips_backend() {
        let dir = tempdir().unwrap();
        {
            let mut engine = engine_in(dir.path(), Arc::new(FakeBackend::new()));
            engine.turn("a red circle").await.unwrap();
            engine.turn("make it blue").await.unwrap();
        }

        let backend = Arc::new(FakeBackend::new());
        let mut engine = engine_in(dir.path(), backend.clone());
        let mut input = ScriptedLines::new(&["history"]).then(ReadLine::Eof);
        let mut out = Vec::new();

        run_interactive(&mut engine, &mut input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(backend.call_count(), 0);
        assert!(text.contains("1. a red circle"));
        assert!(text.contains("2. make it blue"));
        assert!(text.contains(&dir.path().join("out").join("output_001.png").display().to_string()));
        assert!(text.contains(&dir.path().join("out").join("output_002.png").display().to_string()));
        assert!(!text.contains("3. "));
    }

    #[tokio::test]
    async fn loop_survives_failures_and_ends_on_interrupt() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FakeBackend::with_replies([
            Reply::Fail("overloaded".to_string()),
            Reply::Nothing,
            Reply::png(b"ok"),
        ]));
        let mut engine = engine_in(dir.path(), backend.clone());
        let mut input =
            ScriptedLines::new(&["one", "two", "three"]).then(ReadLine::Interrupted);
        let mut out = Vec::new();

        run_interactive(&mut engine, &mut input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(backend.call_count(), 3);
        assert!(text.contains("Failed to generate image"));
        assert!(text.contains("No image in response"));
        assert!(text.contains("Image saved"));
        assert_eq!(engine.session().history().len(), 1);
        assert_eq!(engine.session().history()[0].message, "three");
    }

    #[test]
    fn empty_history_says_so() {
        let session = Session::new("m", "out");
        let mut out = Vec::new();
        write_history(&session, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No messages yet\n");
    }

    #[tokio::test]
    async fn scripted_reports_failure() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FakeBackend::with_replies([Reply::Nothing]));
        let mut engine = engine_in(dir.path(), backend);
        let mut out = Vec::new();

        let produced = run_scripted(&mut engine, "a red circle", &mut out).await.unwrap();

        assert!(!produced);
        assert!(engine.session().history().is_empty());
    }

    #[test]
    fn report_names_mode_and_index() {
        let mut out = Vec::new();
        let produced = report_turn(
            &Ok(TurnOutcome::Produced {
                path: "out/output_002.png".into(),
                index: 2,
                mode: TurnMode::Refine {
                    reference: "out/output_001.png".into(),
                },
            }),
            &mut out,
        )
        .unwrap();
        assert!(produced);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Image saved: out/output_002.png (#2, refined from out/output_001.png)\n"
        );

        let mut out = Vec::new();
        let produced = report_turn(
            &Ok(TurnOutcome::NoArtifact {
                mode: TurnMode::Fresh,
            }),
            &mut out,
        )
        .unwrap();
        assert!(!produced);
        assert!(String::from_utf8(out).unwrap().contains("(new image)"));
    }
}
