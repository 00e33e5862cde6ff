//! Slashkit console host.
//!
//! Registers a set of demo commands against a console platform and reads
//! invocations from stdin, so that the syntax compiler and the argument
//! resolver can be exercised without a chat platform.
//!
//! # Configuration
//!
//! An optional YAML file sets the identity of the console user:
//!
//! ```yaml
//! console:
//!   prefix: "!"
//!   user_id: "console"
//!   channel_id: "stdin"
//!   guild_id: "668485643487412234"
//! ```
//!
//! Any value can be overridden with `SLASHKIT_`-prefixed environment variables,
//! e.g. `SLASHKIT_CONSOLE__PREFIX="?"`.
//!
//! # Usage
//!
//! ```bash
//! # Print the registration payloads and exit
//! slashkit --schema
//!
//! # Interactive session
//! slashkit --config slashkit.yaml
//! !help
//! !todo add buy milk
//! /todo add item=“call mom” priority=5
//! ?todo remove item bu
//! !todo list -p
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use slashkit::{Dispatcher, Invocation};

use crate::{
    config::Config,
    console::ConsolePlatform,
};

mod config;
mod console;
mod demo;

/// Command-line arguments of the console host.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// Defaults and `SLASHKIT_` environment variables are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Print the registration payload of every demo command, then exit.
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting slashkit {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            return;
        }
    };

    let commands = match demo::commands() {
        Ok(commands) => commands,
        Err(e) => {
            error!("Failed to declare demo commands: {}", e);
            return;
        }
    };

    let platform = ConsolePlatform {
        print_schemas: args.schema,
    };
    let mut dispatcher = Dispatcher::new(platform, &config.console.prefix);
    for command in commands {
        if let Err(e) = dispatcher.register(command).await {
            error!("{:#}", e);
            return;
        }
    }
    if args.schema {
        return;
    }

    let template = Invocation {
        channel_id: Some(config.console.channel_id.clone()),
        guild_id: config.console.guild_id.clone(),
        ..Invocation::new("", &config.console.user_id)
    };

    println!(
        "Type `{}help` to list the commands, Ctrl-D to quit.",
        config.console.prefix
    );
    if let Err(e) = console::run(&dispatcher, &template).await {
        error!("Console input failed: {:#}", e);
    }
}
