//! User-facing output for the formcheck CLI.
//!
//! All printing goes through here so the report looks the same from every
//! command: colored text on a terminal, or a stable JSON document with
//! `--json`.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::host::PageModel;

/// Prints the validation report for a finished check run.
pub fn print_report(page: &PageModel, valid: bool, json: bool) -> std::io::Result<()> {
    if json {
        return print_json(page, valid);
    }
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if valid {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(stdout, "All fields are valid.")?;
        stdout.reset()?;
        return Ok(());
    }

    let Some(summary) = page.summary() else {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(stdout, "The form is invalid.")?;
        stdout.reset()?;
        return Ok(());
    };
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    writeln!(stdout, "{}", summary.heading)?;
    stdout.reset()?;
    for entry in &summary.entries {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(stdout, "  {} ", entry.field_id)?;
        stdout.reset()?;
        writeln!(stdout, "{}", entry.message)?;
    }
    Ok(())
}

fn print_json(page: &PageModel, valid: bool) -> std::io::Result<()> {
    let errors: Vec<serde_json::Value> = page
        .summary()
        .map(|summary| {
            summary
                .entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "field": entry.field_id,
                        "number": entry.number,
                        "message": entry.message,
                        "kind": entry.kind.map(|k| k.key()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let report = serde_json::json!({
        "valid": valid,
        "heading": page.summary().map(|s| s.heading.clone()),
        "errors": errors,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
