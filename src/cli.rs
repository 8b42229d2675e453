use std::path::PathBuf;

use semdb::StoreError;
use semdb::config::Config;

/// Flag overrides applied on top of the environment configuration.
/// A flag that was not given leaves the resolved value alone.
#[derive(Debug, Default)]
pub struct Flags {
    pub env_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub backend: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub help: bool,
}

/// Parse flags from a provided argument vector
/// args[0] is the program name
pub fn parse_flags(args: &[String]) -> Result<Flags, String> {
    let mut flags = Flags::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                flags.help = true;
                i += 1;
            }
            "--env-path" => flags.env_path = Some(PathBuf::from(take_value(args, &mut i)?)),
            "--api-key" => flags.api_key = Some(take_value(args, &mut i)?),
            "--api-url" => flags.api_url = Some(take_value(args, &mut i)?),
            "--model" => flags.model = Some(take_value(args, &mut i)?),
            "--backend" => flags.backend = Some(take_value(args, &mut i)?),
            "--host" => flags.host = Some(take_value(args, &mut i)?),
            "--port" => {
                let value = take_value(args, &mut i)?;
                match value.parse::<u16>() {
                    Ok(port) => flags.port = Some(port),
                    Err(_) => {
                        return Err(format!(
                            "Invalid --port value: '{}'. Must be an integer in 0-65535.", value
                        ));
                    }
                }
            }
            other => return Err(format!("Unknown flag: {}. Use --help for usage.", other)),
        }
    }

    Ok(flags)
}

/// Consume the value following a flag, advancing past both
fn take_value(args: &[String], i: &mut usize) -> Result<String, String> {
    if *i + 1 >= args.len() {
        return Err(format!("Flag {} requires a value", args[*i]));
    }
    *i += 2;
    Ok(args[*i - 1].clone())
}

impl Flags {
    /// Apply the overrides to a resolved configuration.
    /// Flags win over environment values, which win over defaults.
    pub fn apply(&self, config: &mut Config) -> Result<(), StoreError> {
        if let Some(key) = &self.api_key {
            config.embedding.api_key = key.clone();
        }
        if let Some(url) = &self.api_url {
            config.embedding.api_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.embedding.model = model.clone();
        }
        if let Some(backend) = &self.backend {
            config.store.backend = backend.parse()?;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        Ok(())
    }
}

pub fn print_usage() {
    println!("semdb - document embedding store");
    println!();
    println!("Usage: semdb [flags]");
    println!();
    println!("Flags:");
    println!("  --env-path <path>   Load environment from this .env file");
    println!("  --api-key <key>     Embedding API key");
    println!("  --api-url <url>     Embedding API base URL");
    println!("  --model <name>      Embedding model name");
    println!("  --backend <kind>    Backend: memory, disk, or remote-cluster");
    println!("  --host <host>       Bind address (default 0.0.0.0)");
    println!("  --port <port>       Server port (default 9000)");
    println!("  --help, -h          Show this help");
}
