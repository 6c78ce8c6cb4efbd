use std::path::Path;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde_json::{json, Value};
use specfix_crypto::content_hash;
use specfix_diff::{diff_rendered, DiffLine, StructuralDiffer};
use specfix_patch::{ApplyReport, PatchApplier};
use specfix_types::{address, Edit, EditSet, Path as DocPath};

use crate::cli::*;
use crate::config::Config;
use crate::error::CliError;
use crate::io;

const FEATURES: [&str; 5] = [
    "array_position_tracking",
    "content_based_hashing",
    "element_mapping",
    "field_modification_detection",
    "skip_operation_categorization",
];

/// How results are printed.
#[derive(Clone, Copy, Debug)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn human(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }

    fn json(&self, value: &Value) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };
    match cli.command {
        Command::Update(args) => cmd_update(&config, args, out),
        Command::Fix(args) => cmd_fix(&config, args, out),
        Command::Verify(args) => cmd_verify(&config, args, out),
        Command::Hash(args) => cmd_hash(args, out),
    }
}

fn cmd_update(config: &Config, args: UpdateArgs, out: Output) -> anyhow::Result<()> {
    let original_path = args.original.unwrap_or_else(|| config.files.original.clone());
    let fixed_path = args.fixed.unwrap_or_else(|| config.files.fixed.clone());
    let fixes_path = args.fixes.unwrap_or_else(|| config.files.fixes.clone());

    let original = io::read_document(&original_path).context("loading original document")?;
    let fixed = io::read_document(&fixed_path).context("loading fixed document")?;

    let differ = StructuralDiffer::new(config.diff_config())?;
    let edits = differ.diff(&original, &fixed)?;
    tracing::debug!(differences = edits.len(), "documents compared");

    let existing = io::read_edit_set_if_exists(&fixes_path).context("loading edit set")?;
    let mut set = existing.unwrap_or_else(|| new_edit_set(&original_path, &fixed_path));
    let total = edits.len();

    let added = if args.dry_run {
        set.new_edits(edits)
    } else {
        set.merge(edits).added
    };

    if out.human() {
        println!("Found {} differences, {} new", total, added.len());
        for edit in &added {
            print_edit(edit);
        }
    }

    let written = !args.dry_run && !added.is_empty();
    if written {
        io::write_json(&fixes_path, &set)?;
    }

    if out.human() {
        if args.dry_run {
            println!("Dry run, {} not written.", fixes_path.display());
        } else if written {
            println!(
                "{} Updated {} with {} new edits",
                "✓".green().bold(),
                fixes_path.display().to_string().bold(),
                added.len()
            );
        } else {
            println!("No new edits for {}", fixes_path.display());
        }
    }

    out.json(&json!({
        "fixes": fixes_path,
        "dry_run": args.dry_run,
        "differences": total,
        "added": added,
    }))
}

fn cmd_fix(config: &Config, args: FixArgs, out: Output) -> anyhow::Result<()> {
    let original_path = args.original.unwrap_or_else(|| config.files.original.clone());
    let fixes_path = args.fixes.unwrap_or_else(|| config.files.fixes.clone());
    let output_path = args.output.unwrap_or_else(|| config.files.fixed.clone());

    let mut doc = io::read_document(&original_path).context("loading original document")?;
    let set = io::read_edit_set(&fixes_path).context("loading edit set")?;

    let report = PatchApplier::new()
        .apply(&mut doc, &set)
        .with_context(|| format!("applying {}", fixes_path.display()))?;
    io::write_json(&output_path, &doc)?;

    if out.human() {
        print_report(&report);
        println!(
            "\n{} Fixed document written to {}",
            "✓".green().bold(),
            output_path.display().to_string().bold()
        );
    }

    out.json(&json!({
        "output": output_path,
        "applied": report.applied_count(),
        "skipped": report.skipped_count(),
        "outcomes": report.outcomes,
    }))
}

fn cmd_verify(config: &Config, args: VerifyArgs, out: Output) -> anyhow::Result<()> {
    let original_path = args.original.unwrap_or_else(|| config.files.original.clone());
    let fixed_path = args.fixed.unwrap_or_else(|| config.files.fixed.clone());
    let fixes_path = args.fixes.unwrap_or_else(|| config.files.fixes.clone());

    let original = io::read_document(&original_path).context("loading original document")?;
    let fixed = io::read_document(&fixed_path).context("loading fixed document")?;
    let set = io::read_edit_set(&fixes_path).context("loading edit set")?;

    let (patched, report) = PatchApplier::new()
        .patched(&original, &set)
        .with_context(|| format!("applying {}", fixes_path.display()))?;
    let diff = diff_rendered(&patched, &fixed);

    if out.human() {
        if diff.is_empty() {
            println!(
                "{} {} edits reproduce {}",
                "✓".green().bold(),
                report.applied_count(),
                fixed_path.display().to_string().bold()
            );
        } else {
            println!(
                "{} patched document differs from {} (+{} -{})",
                "✗".red().bold(),
                fixed_path.display().to_string().bold(),
                diff.additions(),
                diff.deletions()
            );
            for hunk in &diff.hunks {
                println!("{}", hunk.header().cyan());
                for line in &hunk.lines {
                    match line {
                        DiffLine::Added(_) => println!("{}", line.to_string().green()),
                        DiffLine::Removed(_) => println!("{}", line.to_string().red()),
                        DiffLine::Context(_) => println!("{line}"),
                    }
                }
            }
        }
    }

    out.json(&json!({
        "fixed": fixed_path,
        "matches": diff.is_empty(),
        "applied": report.applied_count(),
        "skipped": report.skipped_count(),
        "additions": diff.additions(),
        "deletions": diff.deletions(),
        "diff": diff.unified(),
    }))?;

    if diff.is_empty() {
        Ok(())
    } else {
        Err(CliError::VerifyMismatch { fixed: fixed_path }.into())
    }
}

fn cmd_hash(args: HashArgs, out: Output) -> anyhow::Result<()> {
    let doc = io::read_document(&args.file)?;
    let path = match &args.path {
        Some(encoded) => DocPath::parse(encoded).with_context(|| format!("parsing path {encoded:?}"))?,
        None => DocPath::root(),
    };
    let value = address::get(&doc, &path)
        .with_context(|| format!("nothing at {path} in {}", args.file.display()))?;
    let hash = content_hash(value);

    match out.format {
        OutputFormat::Text => println!("{hash}"),
        OutputFormat::Json => out.json(&json!({ "path": path, "hash": hash }))?,
    }
    Ok(())
}

fn new_edit_set(original: &Path, fixed: &Path) -> EditSet {
    EditSet::new("Hand corrections to a generated API description, recorded by specfix")
        .with_metadata(
            "generated_by",
            json!(format!("specfix {}", env!("CARGO_PKG_VERSION"))),
        )
        .with_metadata(
            "generated_at",
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        )
        .with_metadata("original_spec", json!(display(original)))
        .with_metadata("fixed_spec", json!(display(fixed)))
        .with_metadata("features", json!(FEATURES))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn print_edit(edit: &Edit) {
    println!(
        "  {} {}: {}",
        "+".green(),
        edit.path().to_string().cyan(),
        edit.description()
    );
}

fn print_report(report: &ApplyReport) {
    if report.is_noop() {
        println!("{} No fixes were applied", "!".yellow().bold());
    } else {
        println!("{} Applied {} fixes:", "✓".green().bold(), report.applied_count());
        for message in report.applied() {
            println!("  • {message}");
        }
    }

    if report.skipped_count() > 0 {
        println!(
            "\n{} Skipped {} edits:",
            "-".dimmed(),
            report.skipped_count()
        );
        for message in report.skipped() {
            println!("  • {}", message.dimmed());
        }
    }
}
