//! `colonnade status` — cache state of every template.

use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use colonnade_engine::{staleness::format_system_time_age, status, Freshness, TemplateStatus};

use super::ProjectArgs;

/// Arguments for `colonnade status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, project: &ProjectArgs) -> Result<()> {
        let engine = project.engine()?;
        let templates = status(&engine).context("status check failed")?;

        let report = StatusReport::new(templates);
        if self.json {
            print_json(report)?;
            return Ok(());
        }

        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StatusReport {
    stale_count: usize,
    missing_count: usize,
    templates: Vec<TemplateStatus>,
}

impl StatusReport {
    fn new(templates: Vec<TemplateStatus>) -> Self {
        let stale_count = templates
            .iter()
            .filter(|t| matches!(t.freshness, Freshness::Stale { .. }))
            .count();
        let missing_count = templates
            .iter()
            .filter(|t| t.freshness == Freshness::Missing)
            .count();
        Self {
            stale_count,
            missing_count,
            templates,
        }
    }

    fn needs_compile_count(&self) -> usize {
        self.stale_count + self.missing_count
    }
}

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    templates: Vec<TemplateStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    templates: usize,
    stale: usize,
    missing: usize,
}

#[derive(Serialize)]
struct TemplateStatusJson {
    template: String,
    status: String,
    detail: String,
    artifact: String,
    compiled_at: Option<String>,
    compiled_age: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "template")]
    template: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "compiled")]
    compiled: String,
}

fn print_json(report: StatusReport) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            templates: report.templates.len(),
            stale: report.stale_count,
            missing: report.missing_count,
        },
        templates: report
            .templates
            .into_iter()
            .map(|row| TemplateStatusJson {
                status: freshness_key(&row.freshness).to_string(),
                detail: freshness_detail(&row.freshness),
                artifact: row.artifact.display().to_string(),
                compiled_at: row.compiled_at().map(|at| at.to_rfc3339()),
                compiled_age: compiled_age(&row.freshness),
                template: row.template,
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: StatusReport) {
    println!(
        "Colonnade v{} | {} templates | {} stale | {} missing",
        env!("CARGO_PKG_VERSION"),
        report.templates.len(),
        report.stale_count,
        report.missing_count,
    );

    if report.templates.is_empty() {
        println!("No templates found.");
        return;
    }

    let separator = "■".repeat(67).bright_black().to_string();
    let needs_compile = report.needs_compile_count();

    println!("{separator}");
    println!(
        "Indicators: {} CURRENT  {} STALE  {} MISSING",
        freshness_indicator(&Freshness::Current {
            artifact_modified: SystemTime::UNIX_EPOCH,
        }),
        freshness_indicator(&Freshness::Stale {
            source_modified: SystemTime::UNIX_EPOCH,
            artifact_modified: SystemTime::UNIX_EPOCH,
        }),
        freshness_indicator(&Freshness::Missing),
    );
    println!("{separator}");

    let rows: Vec<StatusTableRow> = report
        .templates
        .into_iter()
        .map(|row| StatusTableRow {
            status: freshness_label(&row.freshness).to_string(),
            detail: freshness_detail(&row.freshness),
            compiled: compiled_age(&row.freshness),
            template: row.template,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{separator}");

    if needs_compile > 0 {
        println!("Run 'colonnade warm' to compile {needs_compile} template(s).");
    }
}

fn compiled_age(freshness: &Freshness) -> String {
    freshness
        .artifact_modified()
        .map(|at| format!("{} ago", format_system_time_age(at)))
        .unwrap_or_else(|| "never".to_string())
}

fn freshness_key(freshness: &Freshness) -> &'static str {
    match freshness {
        Freshness::Missing => "missing",
        Freshness::Stale { .. } => "stale",
        Freshness::Current { .. } => "current",
    }
}

fn freshness_label(freshness: &Freshness) -> &'static str {
    match freshness {
        Freshness::Missing => "MISSING",
        Freshness::Stale { .. } => "STALE",
        Freshness::Current { .. } => "CURRENT",
    }
}

fn freshness_indicator(freshness: &Freshness) -> String {
    match freshness {
        Freshness::Missing => "■".bright_black().bold().to_string(),
        Freshness::Stale { .. } => "■".yellow().bold().to_string(),
        Freshness::Current { .. } => "■".green().bold().to_string(),
    }
}

fn freshness_detail(freshness: &Freshness) -> String {
    match freshness {
        Freshness::Missing => "not compiled".to_string(),
        Freshness::Stale {
            source_modified, ..
        } => format!("source edited {} ago", format_system_time_age(*source_modified)),
        Freshness::Current { .. } => "up to date".to_string(),
    }
}
