//! Thin command-line front end over the audit pipeline.
//!
//! Accepts exactly one positional argument, the package name, and prints
//! the resulting report (or error object) as indented JSON.

use clap::Parser;
use pkgaudit::{audit_json, Cache, Config};

#[derive(Debug, Parser)]
#[command(name = "pkgaudit", about = "Audit a package for supply-chain risk signals")]
struct Opts {
    /// Package name to audit.
    package: String,
}

fn main() {
    env_logger::init();
    let opts = Opts::parse();

    let config = Config::from_env();
    let cache_dir = config
        .cache_dir
        .clone()
        .unwrap_or_else(Cache::default_base_dir);
    let cache = Cache::new(cache_dir, config.cache_ttl);

    let name = opts.package.trim().to_lowercase();
    let result = audit_json(&name, &config, &cache);

    let is_error = result.get("error").is_some();
    let pretty = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
    println!("{pretty}");

    if is_error {
        if let Some(message) = result.get("error").and_then(|v| v.as_str()) {
            eprintln!("{message}");
        }
        std::process::exit(1);
    }
}
