mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use interiors_core::config::Config;
use interiors_server::importer::{FileOutcome, UploadBatch, UploadedFile};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "interiors_admin=trace,interiors_server=trace,interiors_db=debug,interiors_core=debug,tower_http=debug".to_string()
        } else {
            "interiors_admin=info,interiors_server=info,interiors_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(interiors_server::start(config))?;
            Ok(())
        }
        Commands::Import { files } => {
            let config = Config::load_or_default(cli.config.as_deref());
            import_files(&config, &files)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("interiors-admin {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn import_files(config: &Config, paths: &[std::path::PathBuf]) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let data =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(UploadedFile::new(filename, data));
    }

    tracing::debug!(files = files.len(), "Importing from the command line");

    let db = interiors_server::open_database(config)?;
    std::fs::create_dir_all(&config.media.root).with_context(|| {
        format!(
            "Failed to create media directory {}",
            config.media.root.display()
        )
    })?;

    let ctx = interiors_server::context::AppContext::new(config.clone(), db);
    let result = ctx.importer().import(&UploadBatch::new(files));

    for outcome in &result.outcomes {
        match outcome {
            FileOutcome::Created { id, name } => println!("created #{id}: {name}"),
            FileOutcome::Failed { message } => eprintln!("error: {message}"),
        }
    }
    println!("Successfully created {} interiors.", result.success_count());

    if result.success_count() == 0 && !result.outcomes.is_empty() {
        anyhow::bail!("No interiors were created");
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!(
        "  Media: {} (served at {})",
        config.media.root.display(),
        config.media.url_prefix
    );
    println!("  Max upload: {} bytes", config.uploads.max_body_bytes);
    println!(
        "  Sessions: {:?} (ttl {}s)",
        config.sessions.backend, config.sessions.ttl_secs
    );

    for warning in config.validate() {
        println!("  warning: {warning}");
    }

    Ok(())
}
