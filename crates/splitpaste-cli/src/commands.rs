//! Subcommand bodies. Output goes to the given writer so tests can capture it.

use anyhow::{Context, Result};
use splitpaste_core::{
    FolderPrompt, SessionManager, SessionStore, SplitpasteError, detect_markers, split,
};
use splitpaste_types::{BufferSource, DelimiterSpec, MaterializeResult, SessionEvent};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tokio::time::Instant;

/// Read the whole input from `file`, or stdin when none is given.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// List the files a split would produce.
pub fn split_cmd(text: &str, spec: &DelimiterSpec, json: bool, out: &mut dyn Write) -> Result<()> {
    let block = split(text, spec)?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &block)?;
        writeln!(out)?;
        return Ok(());
    }

    if block.is_empty() {
        writeln!(out, "No files found. Marker lines look like: {}", spec.example_line())?;
        return Ok(());
    }
    for segment in &block {
        let note = if segment.is_blank() { " (empty, will be skipped)" } else { "" };
        writeln!(out, "{}\t{} bytes{}", segment.filename, segment.body.len(), note)?;
    }
    Ok(())
}

/// Split `text` and write it under `dest`. When `only` is non-empty just
/// those files are written; names missing from the input count as skipped.
///
/// Input errors are returned. Text without any marker line is reported on
/// `out` and yields an empty result.
pub fn write_cmd(
    manager: &mut SessionManager,
    text: String,
    dest: &Path,
    only: &[String],
    out: &mut dyn Write,
) -> Result<MaterializeResult> {
    let id = manager.create_session(Instant::now())?;
    manager.update_buffer(id, text, BufferSource::Manual)?;
    manager.set_destination(id, dest)?;

    let mut missing = Vec::new();
    if !only.is_empty() {
        manager.deselect_all(id)?;
        for name in only {
            if !manager.select(id, name)? {
                missing.push(name.clone());
            }
        }
    }

    let mut result = match manager.parse(id) {
        Ok(result) => result,
        Err(SplitpasteError::NoSegmentsFound) => {
            if let Some(spec) = manager.session(id)?.delimiter() {
                writeln!(out, "No files found. Marker lines look like: {}", spec.example_line())?;
            }
            manager.close_session(id, Instant::now())?;
            return Ok(MaterializeResult::default());
        }
        Err(e) => return Err(e.into()),
    };
    for name in missing {
        if !result.skipped.contains(&name) {
            result.skipped.push(name);
        }
    }

    print_result(&result, out)?;
    manager.close_session(id, Instant::now())?;
    Ok(result)
}

pub fn print_result(result: &MaterializeResult, out: &mut dyn Write) -> Result<()> {
    for name in &result.written {
        writeln!(out, "written  {}", name)?;
    }
    for name in &result.skipped {
        writeln!(out, "skipped  {}", name)?;
    }
    for failure in &result.errors {
        writeln!(
            out,
            "failed   {} ({:?}: {})",
            failure.filename, failure.kind, failure.detail
        )?;
    }
    Ok(())
}

pub fn detect_cmd(text: &str, out: &mut dyn Write) -> Result<()> {
    for marker in detect_markers(text)? {
        writeln!(out, "{}", marker)?;
    }
    Ok(())
}

pub fn folders_cmd(store: &SessionStore, out: &mut dyn Write) -> Result<()> {
    for folder in store.list_folders()? {
        writeln!(out, "{}", folder.path.display())?;
    }
    Ok(())
}

pub fn history_cmd(store: &SessionStore, limit: Option<usize>, out: &mut dyn Write) -> Result<()> {
    for item in store.list_parsed_items(limit)? {
        writeln!(
            out,
            "{}  {}  {} bytes",
            item.created_at.format("%Y-%m-%d %H:%M:%S"),
            item.filename,
            item.content.len()
        )?;
    }
    Ok(())
}

/// One line describing a session event, for the watch loop.
pub fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::BufferUpdated {
            source, file_count, ..
        } => format!("buffer updated from {:?}: {} files", source, file_count),
        SessionEvent::Materialized {
            destination,
            result,
            ..
        } => format!(
            "wrote {} files to {} ({} skipped, {} failed)",
            result.written.len(),
            destination.display(),
            result.skipped.len(),
            result.errors.len()
        ),
        SessionEvent::ParseFailed { reason, .. } => format!("parse refused: {:?}", reason),
        SessionEvent::FolderInvalid { path, .. } => {
            format!("{} is no longer a folder, auto parse off", path.display())
        }
        SessionEvent::MonitorChanged { monitor, armed, .. } => {
            format!("{:?} monitor {}", monitor, if *armed { "on" } else { "off" })
        }
        SessionEvent::SessionClosed { session_id } => format!("session {} closed", session_id),
    }
}

/// Asks for a folder on a line-oriented reader, offering saved folders.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
    saved: Vec<PathBuf>,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W, saved: Vec<PathBuf>) -> Self {
        Self {
            input,
            output,
            saved,
        }
    }

    fn ask(&mut self) -> io::Result<Option<PathBuf>> {
        for (i, path) in self.saved.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, path.display())?;
        }
        write!(self.output, "Destination folder (number or path, empty to cancel): ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        if let Some(saved) = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.saved.get(i))
        {
            return Ok(Some(saved.clone()));
        }
        Ok(Some(PathBuf::from(answer)))
    }
}

impl<R: BufRead, W: Write> FolderPrompt for LinePrompt<R, W> {
    fn choose_folder(&mut self) -> Option<PathBuf> {
        match self.ask() {
            Ok(choice) => choice,
            Err(e) => {
                tracing::warn!(target: "splitpaste::folder", "Folder prompt failed: {}", e);
                None
            }
        }
    }
}
