//! Runs the RAML fixture corpus: every `pass/*.raml` must parse, every
//! `fail/*.raml` must fail with an error containing the text of its
//! `# expect-error:` line.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser as _;
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use raml_parser::{Parser, ParserConfig};

static EXPECT_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#\s*expect-error:\s*(.+?)\s*$").expect("valid regex"));

#[derive(clap::Parser, Debug)]
struct Args {
    /// directory holding `pass/` and `fail/`
    #[arg(long, default_value = "fixtures")]
    root: PathBuf,

    /// report as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Outcome {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_error: Option<String>,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let parser = Parser::new().with_config(ParserConfig::default());

    let mut outcomes = Vec::new();
    for path in fixtures(&args.root.join("pass"))? {
        outcomes.push(expect_success(&parser, &path));
    }
    for path in fixtures(&args.root.join("fail"))? {
        outcomes.push(expect_failure(&parser, &path)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        report(&outcomes);
    }

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    if failed > 0 {
        bail!("{failed} of {} fixtures failed", outcomes.len());
    }
    Ok(())
}

fn fixtures(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.raml");
    let mut out = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        out.push(entry?);
    }
    out.sort();
    Ok(out)
}

fn expect_success(parser: &Parser, path: &Path) -> Outcome {
    let result = parser.parse_file(path);
    Outcome {
        path: path.display().to_string(),
        expected_error: None,
        passed: result.is_ok(),
        message: result.err().map(|e| e.to_string()),
    }
}

fn expect_failure(parser: &Parser, path: &Path) -> Result<Outcome> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let Some(expected) = EXPECT_ERROR.captures(&text).map(|c| c[1].to_string()) else {
        bail!("{} has no `# expect-error:` line", path.display());
    };
    let (passed, message) = match parser.parse_file(path) {
        Ok(_) => (false, Some("parsed without error".to_string())),
        Err(e) => {
            let message = e.to_string();
            (message.contains(&expected), Some(message))
        }
    };
    Ok(Outcome { path: path.display().to_string(), expected_error: Some(expected), passed, message })
}

fn report(outcomes: &[Outcome]) {
    for outcome in outcomes {
        let status = if outcome.passed { "ok".green() } else { "FAILED".red().bold() };
        println!("{status} {}", outcome.path);
        if !outcome.passed {
            if let Some(expected) = &outcome.expected_error {
                println!("    expected: {expected}");
            }
            if let Some(message) = &outcome.message {
                println!("    got: {message}");
            }
        }
    }
    let passed = outcomes.iter().filter(|o| o.passed).count();
    println!("{passed}/{} fixtures passed", outcomes.len());
}
