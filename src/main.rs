mod ini_file;
mod profiles;

use std::env;
use std::path::PathBuf;

use log::debug;

use self::profiles::rotate::AwsCliRotator;
use self::profiles::{Profiles, RuntimeError};

const AWSCREDS_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, PartialEq)]
enum Command {
    List,
    Activate { profile: String },
    Update { user: String, profiles: String },
}

#[derive(Debug, PartialEq)]
struct Config {
    command: Option<Command>,
    creds_path: Option<PathBuf>,
    verbose: bool,
    version: bool,
}

fn help() {
    println!(
        "Usage:
awscreds-rs --version
awscreds-rs [--file PATH] [-v|--verbose] list
awscreds-rs [--file PATH] [-v|--verbose] activate PROFILE
awscreds-rs [--file PATH] [-v|--verbose] update --user USER --profiles P1,P2,..."
    );
}

fn parse_args(args: Vec<String>) -> Result<Config, String> {
    let mut cfg = Config {
        command: None,
        creds_path: None,
        verbose: false,
        version: false,
    };

    let mut user: Option<String> = None;
    let mut update_profiles: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => cfg.verbose = true,
            "--version" => cfg.version = true,
            "--file" => {
                cfg.creds_path = Some(args.next().ok_or("--file requires a path")?.into());
            }
            "-u" | "--user" => {
                user = Some(args.next().ok_or("--user requires a user name")?);
            }
            "-p" | "--profiles" => {
                update_profiles = Some(args.next().ok_or("--profiles requires a profile list")?);
            }
            _ if arg.starts_with('-') => return Err(format!("Unknown argument: {arg}")),
            _ => positional.push(arg),
        }
    }

    cfg.command = match positional.first().map(String::as_str) {
        Some("list") => Some(Command::List),
        Some("activate") => {
            let profile = positional
                .get(1)
                .ok_or("activate requires a profile name")?
                .clone();
            Some(Command::Activate { profile })
        }
        Some("update") => Some(Command::Update {
            user: user.ok_or("update requires --user")?,
            profiles: update_profiles.ok_or("update requires --profiles")?,
        }),
        Some(other) => return Err(format!("Unknown command: {other}")),
        None if cfg.version => None,
        None => return Err("Too few arguments".into()),
    };

    Ok(cfg)
}

fn run(cfg: &Config) -> Result<(), RuntimeError> {
    let Some(command) = &cfg.command else {
        return Ok(());
    };

    match command {
        Command::List => {
            let profiles = Profiles::load(cfg.creds_path.as_deref())?;
            for name in profiles.names() {
                println!("{name}");
            }
        }
        Command::Activate { profile } => {
            let profiles = Profiles::load(cfg.creds_path.as_deref())?;
            for line in profiles.activation_exports(profile)? {
                println!("{line}");
            }
        }
        Command::Update { user, profiles } => {
            let mut creds = Profiles::load(cfg.creds_path.as_deref())?;
            let names: Vec<&str> = profiles.split(',').collect();
            creds.update_all(&AwsCliRotator, user, &names)?;
        }
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let cfg = match parse_args(args) {
        Ok(cfg) => cfg,
        Err(msg) => {
            eprintln!("Error: {msg}");
            help();
            std::process::exit(1)
        }
    };

    let _ = profiles::logger::init(cfg.verbose);

    if cfg.version {
        println!("awscreds-rs {AWSCREDS_VERSION}");
        std::process::exit(0);
    }

    debug!("Starting awscreds-rs");

    if let Err(e) = run(&cfg) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
