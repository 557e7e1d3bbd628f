#[cfg(feature = "ssr")]
fn main() -> std::process::ExitCode {
    use query_visualizer::core::config::Config;
    use query_visualizer::core::{QueryExtractor, SqlparserGrammar};
    use std::io::Read;
    use std::process::ExitCode;
    use std::sync::Arc;
    use tracing_subscriber::EnvFilter;

    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing on stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    tracing::debug!(
        "Config loaded: dialect={:?}, pretty={}",
        config.dialect,
        config.pretty
    );

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let as_diagram = match args.iter().position(|a| a == "--diagram") {
        Some(idx) => {
            args.remove(idx);
            true
        }
        None => false,
    };

    let query = if args.is_empty() {
        let mut buffer = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
            eprintln!("Failed to read query from stdin: {}", e);
            return ExitCode::FAILURE;
        }
        buffer
    } else {
        args.join(" ")
    };

    let extractor = QueryExtractor::new(Arc::new(SqlparserGrammar::new(config.dialect)));
    let parsed = match extractor.parse(&query) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = if as_diagram {
        let diagram = parsed.to_diagram();
        tracing::info!(
            "Diagram: {} nodes, {} edges",
            diagram.node_count(),
            diagram.edge_count()
        );
        to_json(&diagram, config.pretty)
    } else {
        to_json(&parsed, config.pretty)
    };

    match output {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "ssr")]
fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // the CLI needs the ssr feature
}
