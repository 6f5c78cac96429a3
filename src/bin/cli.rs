//! Pear CLI Client
//!
//! Command-line interface for interacting with a Pear server.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pear::client::Client;
use pear::protocol::{Response, Status};

/// Pear CLI
#[derive(Parser, Debug)]
#[command(name = "pear-cli")]
#[command(about = "CLI for the Pear key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Store a value under a key
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("cannot connect to {}: {}", args.server, e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.command {
        Commands::Get { key } => client.get(key),
        Commands::Put { key, value } => client.put(key, value.as_bytes()),
        Commands::Delete { key } => client.delete(key),
    };

    match result {
        Ok(response) => report(&args.command, &response),
        Err(e) => {
            eprintln!("request failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn report(command: &Commands, response: &Response) -> ExitCode {
    match (command, response.status) {
        (Commands::Get { .. }, Status::Ok) => {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(&response.body);
            let _ = stdout.write_all(b"\n");
            ExitCode::SUCCESS
        }
        (_, Status::Ok) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        (_, status) => {
            eprintln!("{} {}", status.code(), status.reason());
            ExitCode::FAILURE
        }
    }
}
