//! CLI command execution.
//!
//! Configuration is resolved before anything talks to the backend; each command
//! then runs against an [`ImageBackend`] so the flows can be driven by a fake.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::artifact::ArtifactStore;
use crate::batch::{load_prompts, BatchRunner};
use crate::config::Config;
use crate::gemini::{Framing, GeminiClient, GenerateRequest, ImageBackend, ImageOptions};
use crate::models::supports_resolution;
use crate::oneshot::render_to;
use crate::session::{ContinuityEngine, SessionStore};

use super::args::{Cli, Commands};
use super::repl::{run_interactive, run_scripted, LineSource, TerminalLines};

const fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Execute the parsed command line.
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_env().context("configuration error")?;
    tracing::debug!(?config, "loaded configuration");
    let backend: Arc<dyn ImageBackend> =
        Arc::new(GeminiClient::new(&config).context("failed to build HTTP client")?);
    let mut out = std::io::stdout();

    match cli.command {
        Commands::Chat {
            session_file,
            output_dir,
            initial,
            message,
            timeout,
        } => {
            let store = session_file.map(SessionStore::new);
            let session = ContinuityEngine::open_session(store.as_ref(), &cli.model, &output_dir)
                .context("cannot open session")?;
            let mut engine = ContinuityEngine::new(session, store, backend)
                .with_timeout(timeout.map(Duration::from_secs));
            run_chat(
                &mut engine,
                initial.as_deref(),
                message.as_deref(),
                TerminalLines::new,
                &mut out,
            )
            .await
        }
        Commands::Generate {
            prompt,
            output,
            aspect,
            size,
        } => {
            let options = image_options(&cli.model, aspect, size);
            run_generate(backend.as_ref(), &cli.model, &prompt, options, &output, &mut out).await
        }
        Commands::Edit {
            input,
            instructions,
            output,
        } => run_edit(backend.as_ref(), &cli.model, &input, &instructions, &output, &mut out).await,
        Commands::Batch {
            prompts,
            output_dir,
            parallel,
            aspect,
            json,
        } => {
            let runner = BatchRunner::new(backend, cli.model, parallel);
            run_batch(&runner, &prompts, &output_dir, &aspect, json, &mut out).await
        }
    }
}

/// Build request options, dropping a resolution the model cannot honor.
fn image_options(model: &str, aspect: Option<String>, size: Option<String>) -> ImageOptions {
    let resolution = match size {
        Some(size) if !supports_resolution(model) => {
            tracing::warn!(model, size = %size, "resolution is only supported by pro models; ignoring");
            None
        }
        size => size,
    };
    ImageOptions {
        aspect_ratio: aspect,
        resolution,
    }
}

/// Run the optional initial message, then either one scripted message or the
/// interactive loop.
pub async fn run_chat<L: LineSource>(
    engine: &mut ContinuityEngine,
    initial: Option<&str>,
    message: Option<&str>,
    open_input: impl FnOnce() -> Result<L>,
    out: &mut impl Write,
) -> Result<ExitCode> {
    if let Some(initial) = initial {
        if engine.session().history().is_empty() {
            if !run_scripted(engine, initial, out).await? {
                return Ok(ExitCode::FAILURE);
            }
        } else {
            tracing::info!("session already has history; skipping initial message");
        }
    }

    if let Some(message) = message {
        let produced = run_scripted(engine, message, out).await?;
        return Ok(exit_code(produced));
    }

    let mut input = open_input().context("failed to open terminal input")?;
    run_interactive(engine, &mut input, out).await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_generate(
    backend: &dyn ImageBackend,
    model: &str,
    prompt: &str,
    options: ImageOptions,
    output: &Path,
    out: &mut impl Write,
) -> Result<ExitCode> {
    writeln!(out, "Generating image with {model}...")?;
    let request = GenerateRequest::new(model, prompt).with_options(options);
    let produced = render_to(backend, request, output)
        .await
        .context("image generation failed")?;
    report_single(produced, output, out)
}

async fn run_edit(
    backend: &dyn ImageBackend,
    model: &str,
    input: &Path,
    instructions: &str,
    output: &Path,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let source = ArtifactStore::load(input).context("cannot read input image")?;
    writeln!(out, "Editing {} with {model}...", input.display())?;
    let request = GenerateRequest::new(model, instructions).with_reference(source, Framing::Edit);
    let produced = render_to(backend, request, output)
        .await
        .context("image edit failed")?;
    report_single(produced, output, out)
}

fn report_single(produced: bool, output: &Path, out: &mut impl Write) -> Result<ExitCode> {
    if produced {
        writeln!(out, "Image saved to: {}", output.display())?;
    } else {
        writeln!(out, "No image in response")?;
    }
    Ok(exit_code(produced))
}

async fn run_batch(
    runner: &BatchRunner,
    prompts: &Path,
    output_dir: &Path,
    aspect: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let prompts = load_prompts(prompts, aspect)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

    // With --json stdout carries only the summary.
    let mut stderr = std::io::stderr();
    let progress: &mut dyn Write = if json { &mut stderr } else { &mut *out };
    writeln!(
        progress,
        "Generating {} images ({} at a time)",
        prompts.len(),
        runner.parallel()
    )?;

    let summary = runner
        .run(prompts, output_dir, |done, total, detail| {
            let mark = if detail.success { "ok" } else { "FAILED" };
            if let Err(e) = writeln!(
                progress,
                "[{done}/{total}] {} {mark}: {}",
                detail.filename, detail.message
            ) {
                tracing::debug!(error = %e, "failed to write batch progress");
            }
        })
        .await;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        writeln!(
            progress,
            "Batch complete: {} succeeded, {} failed",
            summary.success, summary.failed
        )?;
    }
    Ok(exit_code(summary.all_succeeded()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::repl::ReadLine;
    use crate::gemini::fake::{FakeBackend, Reply};
    use tempfile::tempdir;

    struct NoInput;

    impl LineSource for NoInput {
        fn read_line(&mut self, _prompt: &str) -> Result<ReadLine> {
            Ok(ReadLine::Eof)
        }
    }

    fn engine_in(dir: &Path, backend: Arc<FakeBackend>) -> ContinuityEngine {
        let store = SessionStore::new(dir.join("session.json"));
        let session =
            ContinuityEngine::open_session(Some(&store), "gemini-2.5-flash-image", dir).unwrap();
        ContinuityEngine::new(session, Some(store), backend)
    }

    fn no_terminal() -> Result<NoInput> {
        panic!("terminal input opened in scripted mode")
    }

    #[tokio::test]
    async fn initial_then_scripted_message() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut engine = engine_in(dir.path(), backend.clone());
        let mut out = Vec::new();

        let code = run_chat(
            &mut engine,
            Some("a red circle"),
            Some("make it blue"),
            no_terminal,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(backend.call_count(), 2);
        assert!(backend.requests()[0].reference.is_none());
        assert!(backend.requests()[1].reference.is_some());
        assert!(dir.path().join("output_002.png").is_file());
    }

    #[tokio::test]
    async fn initial_skipped_on_resumed_session() {
        let dir = tempdir().unwrap();
        engine_in(dir.path(), Arc::new(FakeBackend::new()))
            .turn("a red circle")
            .await
            .unwrap();

        let backend = Arc::new(FakeBackend::new());
        let mut engine = engine_in(dir.path(), backend.clone());
        let mut out = Vec::new();

        let code = run_chat(&mut engine, Some("a red circle"), None, || Ok(NoInput), &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(backend.call_count(), 0);
        assert_eq!(engine.session().history().len(), 1);
    }

    #[tokio::test]
    async fn failed_initial_exits_before_message() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FakeBackend::with_replies([Reply::Nothing]));
        let mut engine = engine_in(dir.path(), backend.clone());
        let mut out = Vec::new();

        let code = run_chat(&mut engine, Some("a red circle"), Some("make it blue"), no_terminal, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_failure_exits_nonzero() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FakeBackend::with_replies([Reply::Fail("overloaded".to_string())]));
        let mut engine = engine_in(dir.path(), backend);
        let mut out = Vec::new();

        let code = run_chat(&mut engine, None, Some("a red circle"), no_terminal, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert!(String::from_utf8(out).unwrap().contains("Failed to generate image"));
    }

    #[test]
    fn size_dropped_for_flash_models() {
        let options = image_options("gemini-2.5-flash-image", Some("16:9".into()), Some("2K".into()));
        assert_eq!(options.aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(options.resolution, None);

        let options = image_options("gemini-3-pro-image-preview", None, Some("4K".into()));
        assert_eq!(options.resolution.as_deref(), Some("4K"));
    }

    #[tokio::test]
    async fn generate_writes_output() {
        let dir = tempdir().unwrap();
        let backend = FakeBackend::with_replies([Reply::png(b"cat")]);
        let output = dir.path().join("cat.png");
        let mut out = Vec::new();

        let code = run_generate(&backend, "m", "a cat", ImageOptions::default(), &output, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(std::fs::read(&output).unwrap(), b"cat");
        assert!(String::from_utf8(out).unwrap().contains("Image saved to"));
    }

    #[tokio::test]
    async fn generate_without_image_exits_nonzero() {
        let dir = tempdir().unwrap();
        let backend = FakeBackend::with_replies([Reply::Nothing]);
        let mut out = Vec::new();

        let code = run_generate(
            &backend,
            "m",
            "a cat",
            ImageOptions::default(),
            &dir.path().join("cat.png"),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn edit_sends_input_image() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("photo.jpg");
        std::fs::write(&input, b"jpeg bytes").unwrap();
        let backend = FakeBackend::new();
        let mut out = Vec::new();

        let code = run_edit(
            &backend,
            "m",
            &input,
            "make it black and white",
            &dir.path().join("bw.png"),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        let reference = backend.requests()[0].reference.clone().unwrap();
        assert_eq!(reference.artifact.bytes, b"jpeg bytes");
        assert_eq!(reference.artifact.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn edit_missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let backend = FakeBackend::new();
        let mut out = Vec::new();

        let result = run_edit(
            &backend,
            "m",
            &dir.path().join("missing.png"),
            "x",
            &dir.path().join("out.png"),
            &mut out,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn batch_json_summary_and_exit_code() {
        let dir = tempdir().unwrap();
        let prompts = dir.path().join("prompts.txt");
        std::fs::write(&prompts, "a sunset\na forest\n").unwrap();
        let backend = Arc::new(FakeBackend::with_replies([Reply::png(b"ok"), Reply::Nothing]));
        let runner = BatchRunner::new(backend, "m", 1);
        let output_dir = dir.path().join("images");
        let mut out = Vec::new();

        let code = run_batch(&runner, &prompts, &output_dir, "1:1", true, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        let summary: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(summary["total"], 2);
        assert_eq!(summary["success"], 1);
        assert_eq!(summary["failed"], 1);
    }

    #[tokio::test]
    async fn batch_all_succeed() {
        let dir = tempdir().unwrap();
        let prompts = dir.path().join("prompts.json");
        std::fs::write(&prompts, r#"[{"prompt": "a sunset", "filename": "sunset.png"}]"#).unwrap();
        let runner = BatchRunner::new(Arc::new(FakeBackend::new()), "m", 2);
        let mut out = Vec::new();

        let code = run_batch(&runner, &prompts, dir.path(), "1:1", false, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(dir.path().join("sunset.png").is_file());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[1/1] sunset.png ok"));
        assert!(text.contains("1 succeeded, 0 failed"));
    }

    #[tokio::test]
    async fn batch_missing_prompts_file_is_an_error() {
        let dir = tempdir().unwrap();
        let runner = BatchRunner::new(Arc::new(FakeBackend::new()), "m", 1);
        let mut out = Vec::new();

        let result = run_batch(
            &runner,
            &dir.path().join("nope.txt"),
            dir.path(),
            "1:1",
            false,
            &mut out,
        )
        .await;
        assert!(result.is_err());
    }
}
