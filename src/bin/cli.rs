//! etagkv CLI Client
//!
//! Command-line interface for interacting with etagkv.

use std::io::Write;

use clap::{Parser, Subcommand};
use etagkv::{Client, Fingerprint, KvError};

/// etagkv CLI
#[derive(Parser, Debug)]
#[command(name = "etagkv-cli")]
#[command(about = "CLI for the etagkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8085")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key (fingerprint goes to stderr)
    Get {
        /// The key to get
        key: String,
    },

    /// Print the fingerprint of a value
    Head {
        /// The key to inspect
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Only write if the current value has this fingerprint
        #[arg(long)]
        if_match: Option<Fingerprint>,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        let code = match e {
            KvError::KeyNotFound => 2,
            KvError::PreconditionFailed => 3,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run(args: Args) -> etagkv::Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Get { key } => {
            let (value, fingerprint) = client.get(&key)?.ok_or(KvError::KeyNotFound)?;
            eprintln!("fingerprint: {}", fingerprint);
            let mut stdout = std::io::stdout();
            stdout.write_all(&value)?;
            stdout.write_all(b"\n")?;
        }
        Commands::Head { key } => {
            let fingerprint = client.head(&key)?.ok_or(KvError::KeyNotFound)?;
            println!("{}", fingerprint);
        }
        Commands::Set {
            key,
            value,
            if_match,
        } => {
            let fingerprint = match if_match {
                Some(expected) => client.put_if_match(&key, value, &expected)?,
                None => client.put(&key, value)?,
            };
            println!("{}", fingerprint);
        }
        Commands::Del { key } => {
            client.delete(&key)?;
            println!("OK");
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}
