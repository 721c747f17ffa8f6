use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ignister::config::{settings, ScanConfig};
use ignister::core::{
    common_ignore_patterns, format_file_size, DirectoryScanner, FileTree, NodeId, ScanResult,
    SearchEngine, TracingSink, TreeStatistics,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ignister")]
#[command(version)]
#[command(about = "Scan a project into a filtered, annotated file tree", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory and print its tree and statistics
    Scan {
        /// Directory to scan (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Extra ignore pattern, applied after the configured ones
        #[arg(short = 'p', long = "pattern")]
        patterns: Vec<String>,

        /// Also apply the project's .gitignore
        #[arg(long)]
        gitignore: bool,

        /// Start from an empty pattern list instead of the configured one
        #[arg(long)]
        no_defaults: bool,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,

        /// Only list entries whose name contains this keyword
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Print the built-in ignore patterns
    Patterns,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Scan {
            path,
            patterns,
            gitignore,
            no_defaults,
            json,
            search,
        } => {
            run_scan(
                cli.config.as_deref(),
                path,
                patterns,
                gitignore,
                no_defaults,
                json,
                search,
            )
            .await
        }
        Commands::Patterns => {
            for pattern in common_ignore_patterns() {
                println!("{pattern}");
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> ScanConfig {
    let loaded = match path {
        Some(path) => settings::load_config(Some(path)),
        None => ScanConfig::load(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        ScanConfig::default()
    })
}

async fn run_scan(
    config_path: Option<&Path>,
    path: PathBuf,
    extra_patterns: Vec<String>,
    gitignore: bool,
    no_defaults: bool,
    json: bool,
    search: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path);

    let mut patterns = if no_defaults {
        Vec::new()
    } else {
        config.ignore_patterns.clone()
    };
    patterns.extend(extra_patterns);
    let use_gitignore = gitignore || config.use_gitignore;

    let result = tokio::task::spawn_blocking(move || {
        DirectoryScanner::new().scan(&path, &patterns, use_gitignore, &TracingSink)
    })
    .await
    .context("Scan task failed")??;

    config.last_directory = Some(result.root_path().to_path_buf());
    let saved = match config_path {
        Some(path) => settings::save_config_to(&config, path),
        None => settings::save_config(&config),
    };
    if let Err(e) = saved {
        tracing::warn!("Could not remember last directory: {:#}", e);
    }

    let tree = result.tree();
    if let Some(keyword) = search {
        for id in SearchEngine::search(tree, &keyword) {
            println!("{}", display_path(tree, id));
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(tree)?);
        return Ok(());
    }

    print!("{}", render_outline(tree));
    print_summary(&result);
    Ok(())
}

fn display_path(tree: &FileTree, id: NodeId) -> String {
    let relative = tree.relative_path(id).to_string_lossy().replace('\\', "/");
    if tree.node(id).is_directory() {
        format!("{relative}/")
    } else {
        relative
    }
}

/// Two-space indented listing, directories suffixed with `/`.
fn render_outline(tree: &FileTree) -> String {
    let mut out = String::new();
    let mut stack = vec![(tree.root(), 0usize)];
    while let Some((id, level)) = stack.pop() {
        let node = tree.node(id);
        let suffix = if node.is_directory() { "/" } else { "" };
        out.push_str(&format!("{}{}{}\n", "  ".repeat(level), node.name(), suffix));
        stack.extend(node.children().iter().rev().map(|child| (*child, level + 1)));
    }
    out
}

fn print_summary(result: &ScanResult) {
    let tree = result.tree();
    let stats = TreeStatistics::collect(tree);

    println!();
    println!(
        "{} directories, {} files, {} ({} nodes, depth {})",
        stats.directories,
        stats.files,
        format_file_size(stats.total_size),
        tree.node_count(),
        tree.depth()
    );
    for (ext, count) in stats.top_extensions(5) {
        println!("  {ext:<16} {count}");
    }
    if !result.diagnostics().is_empty() {
        println!("{} entries could not be read", result.diagnostics().len());
    }
    println!("scanned at {}", result.scanned_at().format("%Y-%m-%d %H:%M:%S"));
}
