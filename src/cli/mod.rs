//! The formcheck command-line interface.
//!
//! Loads a declarative form definition plus a set of field values, builds
//! an in-memory page, drives a full submit-style validation pass, and
//! reports the outcome. Exit status: 0 valid, 1 invalid, 2 failure.

use std::collections::BTreeMap;
use std::path::Path;
use std::process;

use clap::Parser;
use serde::Deserialize;
use tracing::debug;

use crate::cli::args::{Command, FormcheckArgs};
use crate::engine::{Engine, FieldRules};
use crate::errors::{FormguardError, Result};
use crate::host::{FileSelection, PageModel};
use crate::rules::int_range::IntRange;
use crate::rules::FieldType;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = FormcheckArgs::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Check { form, values, lang, json } => {
            handle_check(&form, values.as_deref(), lang.as_deref(), json)
        }
        Command::Fields { form } => handle_fields(&form),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(2);
        }
    }
}

/// A form definition: the page language plus its fields.
#[derive(Debug, Deserialize)]
pub struct FormDef {
    #[serde(default)]
    pub lang: Option<String>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDef {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// File fields: maximum upload size in bytes.
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// File fields: extension allow-list.
    #[serde(default)]
    pub allowed_ext: Option<Vec<String>>,
    /// Integer fields: clamp range.
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    /// Apply strict phone input filtering.
    #[serde(default)]
    pub phone: bool,
}

/// One supplied field value: plain text, or a file selection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ValueDef {
    Text(String),
    File { name: String, size: u64 },
}

fn handle_check(
    form_path: &Path,
    values_path: Option<&Path>,
    lang: Option<&str>,
    json: bool,
) -> Result<bool> {
    let form = load_form(form_path)?;
    let values = match values_path {
        Some(path) => load_values(path)?,
        None => BTreeMap::new(),
    };

    let lang = lang
        .map(str::to_string)
        .or_else(|| form.lang.clone())
        .unwrap_or_else(|| "en".to_string());
    let mut page = build_page(&form, &lang);
    let mut engine = Engine::for_page(&page);
    register(&mut engine, &mut page, &form);
    apply_values(&mut page, &mut engine, &form, &values)?;

    engine.notify_submit_clicked(&mut page);
    let valid = engine.validate_all(&mut page);
    // Let the settled summary render and its announcements run.
    engine.advance(&mut page, 500);
    debug!(valid, fields = form.fields.len(), "check finished");

    output::print_report(&page, valid, json).map_err(|source| FormguardError::Io {
        path: "<stdout>".to_string(),
        source,
    })?;
    Ok(valid)
}

fn handle_fields(form_path: &Path) -> Result<bool> {
    let form = load_form(form_path)?;
    for field in &form.fields {
        println!(
            "{}\t{:?}\t{}",
            field.id,
            field.field_type,
            if field.required { "required" } else { "optional" }
        );
    }
    Ok(true)
}

fn load_form(path: &Path) -> Result<FormDef> {
    let text = read(path)?;
    parse(path, &text).map_err(|source| FormguardError::ParseForm {
        path: path.display().to_string(),
        source,
    })
}

fn load_values(path: &Path) -> Result<BTreeMap<String, ValueDef>> {
    let text = read(path)?;
    parse(path, &text).map_err(|source| FormguardError::ParseValues {
        path: path.display().to_string(),
        source,
    })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| FormguardError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parses JSON or YAML by file extension, defaulting to JSON.
fn parse<T: serde::de::DeserializeOwned>(
    path: &Path,
    text: &str,
) -> std::result::Result<T, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if yaml {
        Ok(serde_yaml::from_str(text)?)
    } else {
        Ok(serde_json::from_str(text)?)
    }
}

fn build_page(form: &FormDef, lang: &str) -> PageModel {
    let mut page = PageModel::new(lang);
    for field in &form.fields {
        let label = field.label.clone().unwrap_or_else(|| field.id.clone());
        match field.field_type {
            FieldType::File => {
                page.add_file_field(&field.id, &label);
                let input = format!("{}_input_file", field.id);
                if let Some(max) = field.max_bytes {
                    page.set_attr(&input, "data-max-bytes", &max.to_string());
                }
                if let Some(ext) = &field.allowed_ext {
                    page.set_attr(&input, "data-allowed-ext", &ext.join(", "));
                }
            }
            FieldType::Date => page.add_date_field(&field.id, &label),
            FieldType::Time => {
                page.add_text_field(&field.id, &label);
                page.add_control(&format!("{}_timepicker_description", field.id), "");
            }
            FieldType::Lookup => page.add_select_field(&field.id, &label),
            FieldType::Text => page.add_text_field(&field.id, &label),
        }
    }
    page
}

fn register(engine: &mut Engine, page: &mut PageModel, form: &FormDef) {
    let mut registrations = Vec::new();
    for field in &form.fields {
        let mut reg = FieldRules::new(&field.id).typed(field.field_type);
        if field.required && field.field_type != FieldType::File {
            reg = reg.required();
        }
        registrations.push(reg);
    }
    engine.add_validators(page, registrations);

    for field in &form.fields {
        match field.field_type {
            FieldType::File => {
                if field.required {
                    engine.decorate_required(page, &field.id);
                }
                engine.enable_file_bridge(page, &field.id);
            }
            _ => {
                if field.phone {
                    engine.enable_strict_phone_input(page, &[&field.id]);
                }
                if let (Some(min), Some(max)) = (field.min, field.max) {
                    engine.restrict_int_range(page, &field.id, IntRange::new(min, max));
                }
            }
        }
    }
}

fn apply_values(
    page: &mut PageModel,
    engine: &mut Engine,
    form: &FormDef,
    values: &BTreeMap<String, ValueDef>,
) -> Result<()> {
    for (id, value) in values {
        let Some(field) = form.fields.iter().find(|f| f.id == *id) else {
            return Err(FormguardError::UnknownField { field: id.clone() });
        };
        match value {
            ValueDef::File { name, size } => {
                page.set_file(id, FileSelection::new(name.clone(), *size));
            }
            ValueDef::Text(text) => {
                let control = match field.field_type {
                    FieldType::Date => format!("{id}_datepicker_description"),
                    FieldType::Time => format!("{id}_timepicker_description"),
                    _ => id.clone(),
                };
                page.set_value(&control, text);
                // Run input filters the way a keystroke would.
                engine.notify(page, &control, crate::engine::FieldEvent::Blur, true);
            }
        }
    }
    Ok(())
}
