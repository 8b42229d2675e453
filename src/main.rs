mod cli;

use semdb::config::Config;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let flags = match cli::parse_flags(&args) {
        Ok(flags) => flags,
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(2);
        }
    };

    if flags.help {
        cli::print_usage();
        return Ok(());
    }

    // Load .env before resolving the environment layer
    match &flags.env_path {
        Some(path) => {
            if let Err(error) = dotenvy::from_path(path) {
                eprintln!("Error: cannot load env file '{}': {}", path.display(), error);
                std::process::exit(2);
            }
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(2);
        }
    };

    if let Err(error) = flags.apply(&mut config) {
        eprintln!("Error: {}", error);
        std::process::exit(2);
    }

    semdb::server::run(config).await
}
