//! Command-line front end: validate imports, preview renames, parse CSV,
//! build filter queries and resolve confirmation redirects without a web server

use crate::config::FormsConfig;
use crate::error::{FormError, ValidationErrors};
use crate::filters::{dynamic_formset_factory, StaticFilterSetRegistry, MANAGEMENT_FORM_MESSAGE};
use crate::forms::{
    BulkRenameForm, CleanForm, ConfirmationForm, CsvData, FormData, ImportForm, ImportFormat,
};
use crate::model::ModelMeta;
use anyhow::Context;
use std::fs;
use std::io::Read;
use thiserror::Error;
use tracing::{debug, info};

pub const USAGE: &str = "\
Usage: record-forms <command> [options]

Commands:
  import [--format json|yaml] <file|->             Validate a single-object import
  rename --find X --replace Y [--no-regex] NAME...  Preview a bulk rename
  csv <file|->                                     Parse CSV import data
  filter <registry.json> <app.model> <query>       Build filter parameters
  confirm <query>                                  Print where a confirmation redirects
  help                                             Show this message";

/// Redirect target when a confirmation carries no usable return URL
pub const DEFAULT_RETURN_URL: &str = "/";

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Import {
        format: ImportFormat,
        source: String,
    },
    Rename {
        find: String,
        replace: String,
        use_regex: bool,
        names: Vec<String>,
    },
    Csv {
        source: String,
    },
    Filter {
        registry: String,
        model: ModelMeta,
        query: String,
    },
    Confirm {
        query: String,
    },
    Help,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }

    /// Lines to print on stderr
    pub fn report(&self) -> Vec<String> {
        match self {
            CliError::Validation(errors) => errors
                .iter()
                .flat_map(|(field, messages)| {
                    messages
                        .iter()
                        .map(move |message| format!("{}: {}", field, message))
                })
                .collect(),
            CliError::Usage(message) => vec![message.clone(), String::new(), USAGE.to_string()],
            other => vec![format!("Error: {:#}", other)],
        }
    }
}

fn usage(message: impl Into<String>) -> CliError {
    CliError::Usage(message.into())
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

pub fn parse_args_from<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(Command::Help);
    }
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "help" => Ok(Command::Help),
        "import" => {
            let mut format = ImportFormat::Yaml;
            let mut source = None;
            while let Some(arg) = args.next() {
                if arg == "--format" {
                    let value = args
                        .next()
                        .ok_or_else(|| usage("--format requires a value"))?;
                    format = ImportFormat::parse(&value)
                        .ok_or_else(|| usage(format!("Unknown import format: {}", value)))?;
                } else if source.is_none() {
                    source = Some(arg);
                } else {
                    return Err(usage(format!("Unexpected argument: {}", arg)));
                }
            }
            let source = source.ok_or_else(|| usage("import requires a file or -"))?;
            Ok(Command::Import { format, source })
        }
        "rename" => {
            let mut find = None;
            let mut replace = None;
            let mut use_regex = true;
            let mut names = Vec::new();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--find" => {
                        find = Some(args.next().ok_or_else(|| usage("--find requires a value"))?)
                    }
                    "--replace" => {
                        replace = Some(
                            args.next()
                                .ok_or_else(|| usage("--replace requires a value"))?,
                        )
                    }
                    "--no-regex" => use_regex = false,
                    "--" => names.extend(args.by_ref()),
                    _ => names.push(arg),
                }
            }
            Ok(Command::Rename {
                find: find.ok_or_else(|| usage("rename requires --find"))?,
                replace: replace.ok_or_else(|| usage("rename requires --replace"))?,
                use_regex,
                names,
            })
        }
        "csv" => {
            let source = args.next().ok_or_else(|| usage("csv requires a file or -"))?;
            if let Some(extra) = args.next() {
                return Err(usage(format!("Unexpected argument: {}", extra)));
            }
            Ok(Command::Csv { source })
        }
        "filter" => {
            let (Some(registry), Some(model), Some(query)) =
                (args.next(), args.next(), args.next())
            else {
                return Err(usage("filter requires <registry.json> <app.model> <query>"));
            };
            let model = ModelMeta::from_content_type(&model)
                .ok_or_else(|| usage(format!("Invalid model, expected app.model: {}", model)))?;
            Ok(Command::Filter {
                registry,
                model,
                query,
            })
        }
        "confirm" => {
            let query = args.next().ok_or_else(|| usage("confirm requires <query>"))?;
            if let Some(extra) = args.next() {
                return Err(usage(format!("Unexpected argument: {}", extra)));
            }
            Ok(Command::Confirm { query })
        }
        other => Err(usage(format!("Unknown command: {}", other))),
    }
}

fn read_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read standard input")?;
        return Ok(input);
    }
    fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
}

/// Run `command`, returning what should be printed on stdout
pub fn execute(command: Command, config: &FormsConfig) -> Result<String, CliError> {
    debug!(?command, "Executing command");
    match command {
        Command::Help => Ok(USAGE.to_string()),
        Command::Import { format, source } => import(&read_source(&source)?, format),
        Command::Rename {
            find,
            replace,
            use_regex,
            names,
        } => rename(&find, &replace, use_regex, &names),
        Command::Csv { source } => csv(&read_source(&source)?),
        Command::Filter {
            registry,
            model,
            query,
        } => {
            let registry = StaticFilterSetRegistry::from_json(&read_source(&registry)?)?;
            filter(&registry, &model, &query, config)
        }
        Command::Confirm { query } => confirm(&query, config),
    }
}

fn import(payload: &str, format: ImportFormat) -> Result<String, CliError> {
    let mut form = ImportForm::from_payload(payload, format);
    if !form.is_valid() {
        return Err(CliError::Validation(form.errors().clone()));
    }
    let object = form.object().cloned().unwrap_or_default();
    Ok(serde_json::to_string_pretty(&object).map_err(FormError::from)?)
}

fn rename(
    find: &str,
    replace: &str,
    use_regex: bool,
    names: &[String],
) -> Result<String, CliError> {
    let mut data = FormData::from_pairs([("find", find), ("replace", replace)]);
    if use_regex {
        data.set("use_regex", "on");
    }
    let mut form = BulkRenameForm::with_data(data);
    if !form.is_valid() {
        return Err(CliError::Validation(form.errors().clone()));
    }
    let preview = form.preview(names.iter().map(String::as_str))?;
    info!(objects = preview.len(), "Previewed bulk rename");
    Ok(preview
        .into_iter()
        .map(|(old, new)| format!("{} -> {}", old, new))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn csv(text: &str) -> Result<String, CliError> {
    let data = CsvData::parse(text).map_err(CliError::Validation)?;
    Ok(serde_json::to_string_pretty(&data.records).map_err(FormError::from)?)
}

fn filter(
    registry: &StaticFilterSetRegistry,
    model: &ModelMeta,
    query: &str,
    config: &FormsConfig,
) -> Result<String, CliError> {
    let data = FormData::from_query_string(query);
    let mut formset = dynamic_formset_factory(model, registry, config, Some(data))?;
    if !formset.is_bound() {
        return Err(CliError::Validation(ValidationErrors::non_field(
            MANAGEMENT_FORM_MESSAGE,
        )));
    }
    if !formset.is_valid() {
        let mut errors = formset.non_form_errors().clone();
        for form in &formset {
            let prefix = form.form().prefix().unwrap_or_default();
            for (field, messages) in form.errors().iter() {
                for message in messages {
                    errors.add(&format!("{}-{}", prefix, field), message.as_str());
                }
            }
        }
        return Err(CliError::Validation(errors));
    }
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (lookup_type, value) in formset.filter_params() {
        query.append_pair(&lookup_type, &value);
    }
    Ok(query.finish())
}

fn confirm(query: &str, config: &FormsConfig) -> Result<String, CliError> {
    let mut form = ConfirmationForm::with_data(FormData::from_query_string(query));
    if !form.is_valid() {
        return Err(CliError::Validation(form.errors().clone()));
    }
    let target = form
        .safe_return_url(config.allowed_return_hosts())
        .unwrap_or(DEFAULT_RETURN_URL);
    info!(return_url = target, "Resolved confirmation redirect");
    Ok(target.to_string())
}
