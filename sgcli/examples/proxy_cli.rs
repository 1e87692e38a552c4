//! ProxySG console example
//!
//! Connects to an appliance, prints its identity and runs one command in
//! the requested context.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=sgcmd=info,sgout=info cargo run --example proxy_cli -- \
//!     --config lab.toml --device proxysg_1 --context enable "show cpu"
//! ```
//!
//! Without a config file, pass the address directly:
//! ```bash
//! cargo run --example proxy_cli -- --host 10.0.0.5 --password secret "show clock"
//! ```

use std::env;
use std::path::PathBuf;

use sgcli::{Aspects, CliContext, SessionBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = SessionBuilder::new(&args.device);
    if let Some(path) = &args.config {
        builder = builder.aspects(&Aspects::load(path)?);
    }
    if let Some(host) = &args.host {
        builder = builder.ipaddr(host);
    }
    if let Some(serial) = &args.serial {
        builder = builder.cliaccess("serial").serial(serial);
    }
    if let Some(password) = &args.password {
        builder = builder.password(password);
    }

    let mut session = builder.build()?;
    println!("Connecting to {} ({})...", args.device, session.params().address());

    let info = session.info().await?;
    println!("{}\n", info);

    let context = args
        .context
        .as_deref()
        .map(str::parse::<CliContext>)
        .transpose()?;

    let output = session.command(&args.command, context).await?;
    println!("{}", output);

    if let Some(context) = session.context() {
        println!("\nConsole left at {}", context);
    }

    session.close().await?;
    Ok(())
}

struct Args {
    config: Option<PathBuf>,
    device: String,
    host: Option<String>,
    serial: Option<String>,
    password: Option<String>,
    context: Option<String>,
    command: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut config = None;
        let mut device = "proxysg_1".to_string();
        let mut host = None;
        let mut serial = None;
        let mut password = None;
        let mut context = None;
        let mut command = "show clock".to_string();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        config = Some(PathBuf::from(&args[i]));
                    }
                }
                "--device" | "-d" => {
                    i += 1;
                    if i < args.len() {
                        device = args[i].clone();
                    }
                }
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = Some(args[i].clone());
                    }
                }
                "--serial" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        serial = Some(args[i].clone());
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--context" | "-x" => {
                    i += 1;
                    if i < args.len() {
                        context = Some(args[i].clone());
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => command = other.to_string(),
            }
            i += 1;
        }

        Self {
            config,
            device,
            host,
            serial,
            password,
            context,
            command,
        }
    }

    fn print_help() {
        println!("ProxySG console example");
        println!();
        println!("Usage: proxy_cli [OPTIONS] [COMMAND]");
        println!();
        println!("Options:");
        println!("  -c, --config <FILE>      TOML file with an [aspects] table");
        println!("  -d, --device <NAME>      Device name [default: proxysg_1]");
        println!("  -h, --host <ADDR>        Management address");
        println!("  -s, --serial <IP:PORT>   Use the serial console on this terminal server line");
        println!("  -P, --password <PASS>    Login password");
        println!("  -x, --context <CONTEXT>  root, enable, config or exit");
        println!("      --help               Print help");
    }
}
