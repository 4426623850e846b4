use chrono::Utc;
use clap::Parser;
use curl2har::{parse_curl_command, Har};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "curl2har")]
#[command(about = "Convert curl command lines to HAR requests")]
#[command(version)]
struct Cli {
    /// curl command line (read from stdin if neither this nor --file is given)
    #[arg(value_name = "COMMAND", conflicts_with = "file")]
    command: Option<String>,

    /// Read the curl command line(s) from a file
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Wrap the requests in a complete HAR 1.2 log
    #[arg(long)]
    archive: bool,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let input = match read_input(&cli) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            process::exit(1);
        }
    };

    let requests = match parse_curl_command(&input) {
        Ok(requests) => requests,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    tracing::info!(count = requests.len(), "converted curl commands");

    let json = if cli.archive {
        to_json(&Har::from_requests(requests, Utc::now()), cli.compact)
    } else {
        to_json(&requests, cli.compact)
    };

    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing HAR: {}", e);
            process::exit(1);
        }
    };

    let result: Result<(), String> = match &cli.output {
        Some(path) => File::create(path)
            .and_then(|mut file| file.write_all(json.as_bytes()))
            .map_err(|e| e.to_string()),
        None => io::stdout()
            .write_all(json.as_bytes())
            .map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn read_input(cli: &Cli) -> io::Result<String> {
    if let Some(command) = &cli.command {
        return Ok(command.clone());
    }
    if let Some(path) = &cli.file {
        return fs::read_to_string(path);
    }
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}
