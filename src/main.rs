use std::{fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use pinecone::{
    ast::ast::Node, builtins::global_namespace, check_source, display_error,
    lexer::lexer::tokenize,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pinecone")]
#[command(about = "Parses and type checks a script")]
struct Cli {
    /// Script to check
    file: PathBuf,

    /// Print the token stream before checking
    #[arg(long)]
    tokens: bool,

    /// Print every top level statement with its resolved type
    #[arg(long)]
    ast: bool,

    /// Only report the number of errors
    #[arg(long, short)]
    quiet: bool,
}

fn print_node(node: &Node) {
    match &node.ty {
        Some(ty) => println!("{}  : {}", node, ty),
        None => println!("{}", node),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_name = cli.file.to_string_lossy().to_string();

    let source = match read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            error!(file = file_name.as_str(), %err, "failed to read script");
            return ExitCode::FAILURE;
        }
    };

    if cli.tokens {
        let (tokens, _) = tokenize(&source);
        for token in &tokens {
            token.debug();
        }
    }

    let start = Instant::now();
    let namespace = global_namespace();
    let (nodes, errors) = check_source(&namespace, &source);
    info!(elapsed = ?start.elapsed(), statements = nodes.len(), "checked");

    if cli.ast {
        nodes.iter().for_each(print_node);
    }

    if !cli.quiet {
        for error in &errors {
            display_error(error, &source, &file_name);
        }
    }

    if errors.is_empty() {
        return ExitCode::SUCCESS;
    }

    println!("{} error(s) in {}", errors.len(), file_name);
    ExitCode::FAILURE
}
