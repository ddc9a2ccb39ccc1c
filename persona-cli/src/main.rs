//! persona-cli — terminal front end for the Persona server
//!
//! Prompts for a batch of character personas and submits them to the
//! server's `POST /personas`, or lists what the row store holds.
//!
//! # Subcommands
//! - `submit [-n <count>] [--generate]` — collect and save personas
//! - `list [--json]`                    — show every stored persona
//! - `status`                           — show server health

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use persona_core::{Field, FormState, PersonaRecord, MAX_PERSONAS};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8770";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "persona-cli",
    version,
    about = "Collect character personas and save them to the shared sheet"
)]
struct Cli {
    /// Persona HTTP server URL (overrides PERSONA_HTTP_URL env var)
    #[arg(long, env = "PERSONA_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enter personas interactively and save them
    Submit {
        /// Number of personas to enter (asked for when omitted)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Generate narrative and description text for each persona
        #[arg(long)]
        generate: bool,
    },

    /// Show all personas saved in the sheet
    List {
        /// Print rows as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show Persona server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WarningOut {
    pub position: u32,
    pub message: String,
}

/// Response from POST /personas
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub batch_id: String,
    pub submitted: usize,
    pub saved: Vec<PersonaRecord>,
    pub warnings: Vec<WarningOut>,
    pub message: String,
}

/// Response from GET /personas
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub rows: Vec<PersonaRecord>,
    pub count: usize,
    pub message: Option<String>,
}

// ============================================================================
// Interactive collection
// ============================================================================

fn read_line(input: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        anyhow::bail!("input closed");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask until a count in `1..=MAX_PERSONAS` is entered.
pub fn prompt_count(input: &mut impl BufRead, output: &mut impl Write) -> anyhow::Result<usize> {
    loop {
        write!(output, "Enter number of personas (1-{}): ", MAX_PERSONAS)?;
        output.flush()?;
        let line = read_line(input)?;
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_PERSONAS).contains(&n) => return Ok(n),
            _ => writeln!(output, "Please enter a whole number between 1 and {}.", MAX_PERSONAS)?,
        }
    }
}

/// Prompt for every field of every slot. No validation happens here.
pub fn collect_form(
    count: usize,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<FormState> {
    let mut form = FormState::new(count)?;
    for index in 0..count {
        writeln!(output, "\nCharacter {}", index + 1)?;
        for field in Field::ALL {
            write!(output, "  {} {}: ", field.label(), index + 1)?;
            output.flush()?;
            let value = read_line(input)?;
            form.set(field, index, value.trim())?;
        }
    }
    Ok(form)
}

// ============================================================================
// Output formatting
// ============================================================================

fn truncate(s: &str, max: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Render rows as a fixed-width text table.
pub fn format_table(rows: &[PersonaRecord]) -> String {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                truncate(&r.name, 24),
                truncate(&r.dob, 12),
                truncate(&r.profession, 20),
                truncate(&r.description, 60),
            ]
        })
        .collect();

    let header = ["ID", "Name", "DOB", "Profession", "Description"];
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(c.chars().count());
        }
    }

    let render = |cols: &[String]| -> String {
        cols.iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = vec![render(&header), render(&rule)];
    for row in &cells {
        out.push(render(&row[..]));
    }
    out.join("\n")
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

fn do_submit(server: &str, count: Option<usize>, generate: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let count = match count {
        Some(n) => n,
        None => prompt_count(&mut input, &mut output)?,
    };
    let form = collect_form(count, &mut input, &mut output)?;

    // Generation can take a while per persona
    let client = http_client(if generate { 600 } else { 60 })?;
    let url = format!("{}/personas", server);
    let body = serde_json::json!({
        "count": form.count(),
        "personas": form.drafts(),
        "generate": generate,
    });

    let resp = match client.post(&url).json(&body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("persona-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("persona-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    let report: SubmitResponse = resp.json()?;

    println!();
    for w in &report.warnings {
        println!("⚠️  {}", w.message);
    }
    for r in &report.saved {
        println!("✅ Saved Character {}: {} ({})", r.id, r.name, r.profession);
    }
    println!(
        "{} ({} of {} saved, batch {})",
        report.message,
        report.saved.len(),
        report.submitted,
        report.batch_id
    );

    Ok(())
}

fn do_list(server: &str, json_output: bool) -> anyhow::Result<()> {
    let client = http_client(30)?;
    let url = format!("{}/personas", server);

    let resp = match client.get(&url).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("persona-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("persona-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    let list: ListResponse = resp.json()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&list.rows)?);
    } else if list.rows.is_empty() {
        println!("{}", list.message.as_deref().unwrap_or("No personas saved yet."));
    } else {
        println!("{}", format_table(&list.rows));
        println!("\n{} personas", list.count);
    }

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Persona server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("Spreadsheet:    {}", body["store"]["title"].as_str().unwrap_or("?"));
            println!("Sheet ID:       {}", body["store"]["id"].as_str().unwrap_or("?"));
            println!("Generation:     {}", body["generation"].as_str().unwrap_or("disabled"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("persona-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("persona-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Submit { count, generate } => do_submit(&server, count, generate),
        Commands::List { json } => do_list(&server, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("persona-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
