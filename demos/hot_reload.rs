//! Example demonstrating per-section hot reload.
//!
//! This example shows how to:
//! - Register consumers for top-level configuration sections
//! - Receive fresh sections when the file is written
//! - Observe reload failures without losing the running configuration
//!
//! Run with: cargo run --example hot_reload
//!
//! While running, edit demos/config/hot_reload.yaml in place to see reloads.
//! Set RUST_LOG=hotswap_configurator=debug to watch the dispatcher at work.

use hotswap_configurator::prelude::*;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
struct ServerConfig {
    port: u16,
    host: String,
}

/// A component that keeps its own copy of the `server` section.
struct Server {
    current: Mutex<ServerConfig>,
}

impl Consumer for Server {
    fn name(&self) -> &str {
        "server"
    }

    fn on_change(&self, section: ConfigTree) {
        match section.try_deserialize::<ServerConfig>() {
            Ok(cfg) => {
                println!("[server] now listening on {}:{}", cfg.host, cfg.port);
                if let Ok(mut current) = self.current.lock() {
                    *current = cfg;
                }
            }
            Err(e) => println!("[server] ignoring invalid section: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Hot Reload Example ===\n");

    let config_path = "demos/config/hot_reload.yaml";
    if !std::path::Path::new(config_path).exists() {
        std::fs::create_dir_all("demos/config")?;
        std::fs::write(
            config_path,
            r#"server:
  port: 8080
  host: localhost

database:
  url: postgres://localhost/mydb
  max_connections: 10
"#,
        )?;
        println!("Created {}", config_path);
    }

    let configurator = Configurator::builder(config_path)
        .on_reload_error(|e| println!("[configurator] reload failed, keeping old config: {}", e))
        .build()?;

    configurator.add(Server {
        current: Mutex::new(ServerConfig::default()),
    });

    configurator.add_fn("database", |section| {
        let url: Option<String> = section.get("url").ok().flatten();
        let max: Option<u32> = section.get("max_connections").ok().flatten();
        println!("[database] url={:?} max_connections={:?}", url, max);
    });

    configurator.add_fn("cache", |section| {
        if section.is_empty() {
            println!("[cache] no section, using defaults");
        } else {
            println!("[cache] keys: {:?}", section.keys().collect::<Vec<_>>());
        }
    });

    println!(
        "\nWatching {} for 60 seconds (debounce {:?})...\n",
        configurator.path().display(),
        configurator.debounce_window()
    );

    tokio::time::sleep(Duration::from_secs(60)).await;

    let status = configurator.reload_status();
    println!(
        "\nDone: {} dispatch cycles, {} failed reloads, {} debounced writes",
        status.dispatch_cycles, status.failures, status.discarded_events
    );

    Ok(())
}
