//! pegmark CLI - insert markup for grammar matches into an XML document
//!
//! Usage: pegmark [OPTIONS] <GRAMMAR> <INPUT>

use clap::{Arg, ArgAction, Command};
use pegmark::{Document, GrammarSource, MarkupScanner, ScanOptions};
use std::io::Read;
use std::process;
use std::time::Instant;
use tracing::{debug, Level};

fn main() {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    let matches = Command::new("pegmark")
        .version(VERSION)
        .about("Scan the text of an XML document with a PEG grammar and mark up every match.")
        .arg(
            Arg::new("grammar")
                .required(true)
                .help("The grammar file, or the grammar itself preceded by an exclamation point (!)."),
        )
        .arg(
            Arg::new("input")
                .required(true)
                .help("The input file, '-' for standard input, or the input itself preceded by an exclamation point (!)."),
        )
        .arg(
            Arg::new("option")
                .short('o')
                .long("option")
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("A scan option such as completeMatch=true or withinElementName=c. May be repeated."),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .action(ArgAction::SetTrue)
                .help("Treat the input as plain text rather than XML."),
        )
        .arg(
            Arg::new("timing")
                .long("timing")
                .action(ArgAction::SetTrue)
                .help("Print timing information to standard error."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log grammar compilation and every match to standard error."),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let mut options = ScanOptions::new();
    for option in matches.get_many::<String>("option").into_iter().flatten() {
        let Some((key, value)) = option.split_once('=') else {
            fail(&format!("Option '{}' is not of the form KEY=VALUE", option));
        };
        if !options.set(key, value) {
            eprintln!("Warning: ignoring unknown option '{}'", key);
        }
    }

    let grammar = match matches.get_one::<String>("grammar") {
        Some(arg) => match arg.strip_prefix('!') {
            Some(literal) => GrammarSource::text(literal),
            None => GrammarSource::file(arg),
        },
        None => fail("Missing grammar"),
    };
    let input = match matches.get_one::<String>("input") {
        Some(arg) => read_input(arg),
        None => fail("Missing input"),
    };
    let timing = matches.get_flag("timing");

    let start = Instant::now();
    let scanner = match MarkupScanner::new(&grammar, options) {
        Ok(scanner) => scanner,
        Err(e) => fail(&e.to_string()),
    };
    if timing {
        eprintln!("Grammar compiled in {:?}", start.elapsed());
    }

    let mut document = if matches.get_flag("text") {
        Document::from_text(&input)
    } else {
        match Document::from_xml(&input) {
            Ok(document) => document,
            Err(e) => fail(&e.to_string()),
        }
    };
    debug!("Input has {} characters", document.len());

    let scan_start = Instant::now();
    if let Err(e) = scanner.scan(&mut document) {
        fail(&e.to_string());
    }
    if timing {
        eprintln!("Input scanned in {:?}", scan_start.elapsed());
        eprintln!("Total time: {:?}", start.elapsed());
    }

    println!("{}", document.to_xml());
}

fn read_input(arg: &str) -> String {
    if let Some(literal) = arg.strip_prefix('!') {
        return literal.to_string();
    }
    let result = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer).map(|_| buffer)
    } else {
        std::fs::read_to_string(arg)
    };
    result.unwrap_or_else(|e| fail(&format!("Error reading {}: {}", arg, e)))
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}
