//! revottr CLI
//!
//! - `revottr query`: every binding of a template consistent with a graph
//! - `revottr facts`: the fact bindings extracted from a graph

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

use revottr_core::{EvalConfig, Evaluator, MappingSet, PrefixMap, TemplateLibrary};

#[derive(Parser)]
#[command(name = "revottr")]
#[command(
    author,
    version,
    about = "Reverse OTTR: find the template instances that could have produced a graph"
)]
struct Cli {
    /// Log verbosity on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reverse-evaluate a template against a graph.
    Query {
        /// Graph file (.nt, .ttl, .rdf/.owl/.xml).
        #[arg(long)]
        graph: PathBuf,

        /// JSON array of template definitions.
        #[arg(long)]
        library: PathBuf,

        /// IRI of the template to query.
        #[arg(long)]
        template: String,

        /// Extra repetitions allowed per list element when inverting list expansion.
        #[arg(long, default_value_t = 1)]
        max_repetitions: usize,

        /// Evaluate pattern instances in parallel.
        #[arg(long)]
        parallel: bool,

        /// Namespace prefix used when printing (repeatable).
        #[arg(long = "prefix", value_name = "PREFIX=NAMESPACE", value_parser = parse_prefix)]
        prefixes: Vec<(String, String)>,

        /// Print bindings as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the fact bindings extracted from a graph.
    Facts {
        #[arg(long)]
        graph: PathBuf,

        /// Include the omission bindings of `ottr:NullableTriple`.
        #[arg(long)]
        nullable: bool,

        #[arg(long = "prefix", value_name = "PREFIX=NAMESPACE", value_parser = parse_prefix)]
        prefixes: Vec<(String, String)>,
    },
}

fn parse_prefix(raw: &str) -> std::result::Result<(String, String), String> {
    let (prefix, namespace) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=NAMESPACE, got `{raw}`"))?;
    if prefix.is_empty() || namespace.is_empty() {
        return Err(format!("empty prefix or namespace in `{raw}`"));
    }
    Ok((prefix.to_string(), namespace.to_string()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn prefix_map(prefixes: Vec<(String, String)>) -> PrefixMap {
    let mut map = PrefixMap::default();
    for (prefix, namespace) in prefixes {
        map.insert(prefix, namespace);
    }
    map
}

fn load_library(path: &Path) -> Result<TemplateLibrary> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    TemplateLibrary::from_json(&text).with_context(|| format!("loading {}", path.display()))
}

fn print_bindings(bindings: &MappingSet, prefixes: &PrefixMap, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(bindings)?);
        return Ok(());
    }
    for binding in bindings {
        println!("{}", prefixes.mapping(binding));
    }
    Ok(())
}

fn cmd_query(
    graph: &Path,
    library: &Path,
    template: &str,
    config: EvalConfig,
    prefixes: &PrefixMap,
    json: bool,
) -> Result<()> {
    let facts = revottr_rdf::facts_from_file(graph)?;
    let library = load_library(library)?;

    eprintln!(
        "{} {} against {} ({} facts, {} templates)",
        "Querying".green().bold(),
        template.bold(),
        graph.display(),
        facts.len(),
        library.len()
    );

    let evaluator = Evaluator::new(&library, &facts, config);
    let bindings = evaluator
        .evaluate_query(template)
        .with_context(|| format!("evaluating {template}"))?;

    print_bindings(&bindings, prefixes, json)?;
    eprintln!("{} {} bindings", "ok".green().bold(), bindings.len());
    Ok(())
}

fn cmd_facts(graph: &Path, nullable: bool, prefixes: &PrefixMap) -> Result<()> {
    let facts = revottr_rdf::facts_from_file(graph)?;
    let bindings = if nullable {
        facts.nullable()
    } else {
        facts.triples()
    };
    print_bindings(bindings, prefixes, false)?;
    eprintln!("{} {} facts", "ok".green().bold(), facts.len());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            graph,
            library,
            template,
            max_repetitions,
            parallel,
            prefixes,
            json,
        } => {
            let config = EvalConfig::default()
                .with_max_repetitions(max_repetitions)
                .with_parallel(parallel);
            cmd_query(
                &graph,
                &library,
                &template,
                config,
                &prefix_map(prefixes),
                json,
            )?;
        }
        Commands::Facts {
            graph,
            nullable,
            prefixes,
        } => {
            cmd_facts(&graph, nullable, &prefix_map(prefixes))?;
        }
    }
    Ok(())
}
