//! Hash, generate and verify account passwords from the command line.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;

use auth::{generate_password, hash_password, verify_password};

#[derive(Parser, Debug)]
#[command(name = "workreq-password")]
#[command(about = "Password hash utility for work request accounts")]
#[command(after_help = "Examples:\n  workreq-password --password admin123\n  workreq-password --generate --length 20\n  workreq-password --verify admin123 --hash '$argon2id$...'")]
struct Args {
    /// Password to hash
    #[arg(long)]
    password: Option<String>,

    /// Generate a random password and print it with its hash
    #[arg(long)]
    generate: bool,

    /// Length of the generated password
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u16).range(4..=256))]
    length: u16,

    /// Password to check against --hash
    #[arg(long, requires = "hash")]
    verify: Option<String>,

    /// Stored hash to verify against
    #[arg(long, requires = "verify")]
    hash: Option<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if args.generate {
        let password = generate_password(usize::from(args.length));
        let hash = hash_password(&password)?;
        println!("Generated Password: {password}");
        println!("Password Hash: {hash}");
        return Ok(ExitCode::SUCCESS);
    }

    if let (Some(candidate), Some(hash)) = (&args.verify, &args.hash) {
        return if verify_password(candidate, hash) {
            println!("Password matches hash");
            Ok(ExitCode::SUCCESS)
        } else {
            println!("Password does not match hash");
            Ok(ExitCode::FAILURE)
        };
    }

    if let Some(password) = &args.password {
        let hash = hash_password(password)?;
        println!("Password: {password}");
        println!("Hash: {hash}");
        return Ok(ExitCode::SUCCESS);
    }

    Args::command().print_help()?;
    Ok(ExitCode::FAILURE)
}
