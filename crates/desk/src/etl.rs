//! ETL chat: a CSV is loaded, shown, and copied to a private temp directory
//! whose path goes with every question.

use anyhow::{Context, Result, anyhow};
use crossterm::style::Stylize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use switchboard_shared::etl::read_csv_file;
use switchboard_shared::normalize;
use tempfile::TempDir;

use crate::client::McpClient;
use crate::render;
use crate::ui::{TranscriptEntry, call_with_indicator, connect, print_transcript, read_line};

pub const ETL_TOOL: &str = "etl_tool";

/// The uploaded file, alive until the session ends.
pub struct Upload {
    _dir: TempDir,
    pub path: PathBuf,
}

impl Upload {
    /// Copies `source` into a fresh temp directory, keeping its file name.
    pub fn copy(source: &Path) -> Result<Self> {
        let name = source
            .file_name()
            .ok_or_else(|| anyhow!("'{}' is not a file path", source.display()))?;
        let dir = tempfile::tempdir().context("Failed to create a temp directory")?;
        let path = dir.path().join(name);
        std::fs::copy(source, &path)
            .with_context(|| format!("Failed to copy {}", source.display()))?;
        Ok(Self { _dir: dir, path })
    }
}

pub struct EtlSession {
    client: McpClient,
    /// Used when reading uploads for the preview, e.g. utf-8 or latin-1.
    encoding: String,
    upload: Option<Upload>,
    pub transcript: Vec<TranscriptEntry>,
}

impl EtlSession {
    pub fn new(client: McpClient, encoding: impl Into<String>) -> Self {
        Self {
            client,
            encoding: encoding.into(),
            upload: None,
            transcript: Vec::new(),
        }
    }

    pub fn csv_path(&self) -> Option<&Path> {
        self.upload.as_ref().map(|u| u.path.as_path())
    }

    /// Shows the file as a table and replaces the current upload with a
    /// fresh copy of it.
    pub fn load(&mut self, source: &Path) -> Result<()> {
        let table = read_csv_file(source, &self.encoding)?;
        println!("{}", render::format_table(&table.data));
        println!("{} rows, {} columns\n", table.data.len(), table.columns.len());

        self.upload = Some(Upload::copy(source)?);
        Ok(())
    }

    pub fn arguments(&self, question: &str) -> Value {
        let mut arguments = json!({"question": question});
        if let Some(path) = self.csv_path() {
            arguments["csv_path"] = json!(path.to_string_lossy());
        }
        arguments
    }

    pub async fn ask(&mut self, question: &str) {
        self.transcript.push(TranscriptEntry {
            role: "user",
            content: question.to_string(),
        });

        let content = match call_with_indicator(&self.client, ETL_TOOL, self.arguments(question)).await {
            Ok(response) => {
                let rendered = normalize(&response);
                render::print_rendered(&rendered);
                rendered.transcript_entry()
            }
            Err(e) => {
                render::error(&e);
                format!("Error: {:#}", e)
            }
        };

        self.transcript.push(TranscriptEntry {
            role: "assistant",
            content,
        });
    }
}

pub async fn interactive_etl(mut session: EtlSession, csv: Option<PathBuf>) -> Result<()> {
    render::heading("Data engineer ETL assistant");
    println!("1. Load a CSV with /upload PATH to explore it with the ETL tools.");
    println!("2. Ask anything about your data, or have the agent run a tool on it.");
    println!("Commands: /upload PATH, /history, quit\n");
    connect(&session.client).await;

    if let Some(path) = csv {
        if let Err(e) = session.load(&path) {
            render::error(&e);
        }
    }

    loop {
        let Some(input) = read_line(&format!("{} ", "You:".bold().green()))? else {
            break;
        };

        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        if input == "/history" {
            print_transcript(&session.transcript, "ETL agent");
            continue;
        }
        if let Some(path) = input.strip_prefix("/upload") {
            let path = path.trim();
            if path.is_empty() {
                render::warning("Usage: /upload PATH");
            } else if let Err(e) = session.load(Path::new(path)) {
                render::error(&e);
            }
            continue;
        }

        if session.csv_path().is_none() {
            render::warning("No CSV loaded yet; the agent will not see any data.");
        }

        println!();
        session.ask(&input).await;
        println!();
    }

    Ok(())
}
