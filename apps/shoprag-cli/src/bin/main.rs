use std::env;
use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};

use shoprag_cli::{build_engine, init_tracing, load_settings};
use shoprag_rag::RagEngine;

/// Cruelty-free shopping assistant over the product catalog.
#[derive(Parser, Debug)]
#[command(name = "shoprag")]
#[command(about = "Ask about animal-derived products and their vegan alternatives", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the index from the catalog and persist it
    Build,
    /// Answer a single question
    Ask {
        query: String,
    },
    /// Interactive question loop; type `exit` to quit
    Chat,
    /// List products matching a category and/or vegan price ceiling
    Suggest {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// List product categories
    Categories,
    /// Show index status
    Status,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;
    let base = env::current_dir()?;
    let needs_generator = matches!(cli.command, Command::Ask { .. } | Command::Chat);
    let engine = build_engine(settings, &base, needs_generator)?;

    match cli.command {
        Command::Build => {
            engine.rebuild()?;
            let status = engine.status();
            println!("Indexed {} products (dim {})", status.chunks, status.dim);
        }
        Command::Ask { query } => {
            engine.initialize()?;
            println!("{}", engine.answer(&query).answer);
        }
        Command::Chat => {
            engine.initialize()?;
            chat(&engine)?;
        }
        Command::Suggest { category, max_price } => {
            engine.initialize()?;
            let res = engine.suggestions(category.as_deref(), max_price)?;
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
        Command::Categories => {
            engine.initialize()?;
            for category in engine.categories() {
                println!("{}", category);
            }
        }
        Command::Status => {
            // A missing or broken index is reported, not fatal, here.
            if let Err(e) = engine.initialize() {
                eprintln!("index not loaded: {}", e);
            }
            println!("{}", serde_json::to_string_pretty(&engine.status())?);
        }
    }
    engine.shutdown();
    Ok(())
}

fn chat(engine: &RagEngine) -> anyhow::Result<()> {
    println!("Welcome to the cruelty-free shopping assistant. Type 'exit' to quit.\n");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Ask about a product (or 'exit'): ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let query = line?;
        let query = query.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }
        println!("\n{}\n", engine.answer(query).answer);
    }
    println!("Goodbye!");
    Ok(())
}
