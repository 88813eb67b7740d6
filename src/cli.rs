//! CLI: resolve RAML documents to JSON, or check a value against a declared type.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use raml_parser::{ParserConfig, RootDocument, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse RAML 1.0 documents, resolve their types and validate values against them
#[derive(Parser, Debug)]
#[command(name = "raml-parser", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse and resolve documents, print them as JSON
    Parse(ParseOut),
    /// validate a JSON or YAML value against a declared type
    Check(CheckValue),
}

#[derive(Args, Debug, Clone)]
struct ParseSettings {
    /// JSON file with parser settings; the flags below override it, and
    /// `--flag=false` turns off a setting the file enables
    #[arg(long)]
    config: Option<PathBuf>,

    /// require the first line to be `#%RAML 1.0`
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    check_raml_version: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    ignore_unused_annotation: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    ignore_unused_trait: Option<bool>,

    /// integers and numbers are interchangeable when checking examples
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    allow_integer_to_be_number: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    allow_array_to_be_null: Option<bool>,

    /// required properties may be present but empty
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    allow_required_property_to_be_empty: Option<bool>,

    /// cache resolved documents in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// lines of source shown around a YAML syntax error (negative disables)
    #[arg(long, allow_hyphen_values = true)]
    error_trace_distance: Option<i64>,
}

#[derive(clap::Parser, Debug)]
struct ParseOut {
    /// One or more inputs. May be RAML files, directories or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    #[command(flatten)]
    settings: ParseSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckValue {
    /// RAML file or directory
    #[arg(long, short)]
    input: PathBuf,

    /// declared type, optionally qualified by library (`assets.Order`)
    #[arg(long = "type", short)]
    type_name: String,

    /// JSON or YAML file holding the value
    #[arg(long)]
    value: PathBuf,

    #[command(flatten)]
    settings: ParseSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ParseSettings {
    fn load_config(&self) -> Result<ParserConfig> {
        let mut config = match &self.config {
            Some(path) => ParserConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ParserConfig::default(),
        };
        // an absent flag keeps the file value
        let overrides = [
            (&mut config.check_raml_version, self.check_raml_version),
            (&mut config.ignore_unused_annotation, self.ignore_unused_annotation),
            (&mut config.ignore_unused_trait, self.ignore_unused_trait),
            (&mut config.check_value_options.allow_integer_to_be_number, self.allow_integer_to_be_number),
            (&mut config.check_value_options.allow_array_to_be_null, self.allow_array_to_be_null),
            (
                &mut config.check_value_options.allow_required_property_to_be_empty,
                self.allow_required_property_to_be_empty,
            ),
        ];
        for (setting, flag) in overrides {
            if let Some(value) = flag {
                *setting = value;
            }
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_directory = Some(dir.clone());
        }
        if let Some(distance) = self.error_trace_distance {
            config.error_trace_distance = distance;
        }
        Ok(config)
    }

    fn parser(&self) -> Result<raml_parser::Parser> {
        let config = self.load_config()?;
        tracing::debug!(?config, "parser settings");
        Ok(raml_parser::Parser::new().with_config(config))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Parse(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

impl ParseOut {
    fn run(&self) -> Result<()> {
        let parser = self.settings.parser()?;
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;

        // 1) parse every input in parallel
        let parsed: Vec<(PathBuf, raml_parser::Result<RootDocument>)> = source_paths
            .par_iter()
            .map(|path| (path.clone(), parser.parse_file(path)))
            .collect();

        // 2) one document as-is, several keyed by path
        let mut documents = serde_json::Map::new();
        for (path, result) in parsed {
            let doc = result.with_context(|| format!("failed to parse {}", path.display()))?;
            documents.insert(path.display().to_string(), serde_json::to_value(&doc)?);
        }
        let output = match (source_paths.len(), documents.values().next()) {
            (1, Some(single)) => single.clone(),
            _ => serde_json::Value::Object(documents),
        };

        // 3) write
        let text = if self.compact { serde_json::to_string(&output)? } else { serde_json::to_string_pretty(&output)? };
        write_output(self.out.as_deref(), &text)
    }
}

impl CheckValue {
    fn run(&self) -> Result<()> {
        let parser = self.settings.parser()?;
        let doc = parser.parse_file(&self.input).with_context(|| format!("failed to parse {}", self.input.display()))?;
        let Some(api_type) = doc.library.get_type(&self.type_name) else {
            bail!("type {:?} is not declared in {}", self.type_name, self.input.display());
        };
        let source = std::fs::read(&self.value).with_context(|| format!("failed to read {}", self.value.display()))?;
        let value = read_value(&source).with_context(|| format!("failed to decode {}", self.value.display()))?;
        raml_parser::check_value_api_type(api_type, &value, &parser.config().check_value_options)
            .with_context(|| format!("{} does not match type {}", self.value.display(), self.type_name))?;
        println!("{} {} matches {}", "ok".green().bold(), self.value.display(), self.type_name);
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// JSON first, then YAML.
fn read_value(source: &[u8]) -> Result<Value> {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(source) {
        return Ok(Value::from(json));
    }
    let yaml = serde_yaml::from_slice::<serde_yaml::Value>(source)?;
    Ok(Value::from_yaml(&yaml)?)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "wrote output");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
