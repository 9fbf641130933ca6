// src/main.rs

use clap::Parser;
use halstore::{render_graph, CommandLineInput, ExploreConfig, HalStore};
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("halstore.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // stdout carries the rendered graph
    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Resolves the requested resource and prints its graph.
async fn explore(config: &ExploreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = HalStore::from_config(&config.store)?;
    log::info!(
        "Resolving '{}' against {} (depth {})",
        config.uri,
        store.api_root(),
        config.depth
    );

    let exploration = render_graph(&store, &config.uri, config.depth).await?;

    let output = if config.pipe {
        serde_json::to_string(&exploration.graph)?
    } else {
        serde_json::to_string_pretty(&exploration.graph)?
    };
    println!("{}", output);

    if config.pipe {
        return Ok(());
    }

    eprintln!(
        "Resolved {} resources ({} cached keys).",
        exploration.resources,
        store.cache().len()
    );
    for (key, reason) in &exploration.failures {
        eprintln!("⚠️  {} could not be resolved: {}", key, reason);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = ExploreConfig::resolve(cli)?;

    explore(&config).await?;

    Ok(())
}
