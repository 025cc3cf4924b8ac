//! # Command-Line Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin ink -- hide photo.jpg -m "meet at noon" -p hunter2 -o hidden.png
//! cargo run --bin ink -- reveal hidden.png -p hunter2
//! ```
//!
//! Without `-m`, the message is read from stdin. When revealing an encrypted
//! message without `-p`, the password is prompted for on the terminal
//! without echo.
//!
//! Exit codes: 0 success, 1 error, 2 no message found, 3 password missing or
//! wrong, 4 locked out.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, LevelFilter};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use invisible_ink::common::config::InkConfig;
use invisible_ink::common::logging::init_logger;
use invisible_ink::{hide_file, InkService, RevealOutcome};

/// Throttle identity for local invocations.
const LOCAL_IDENTITY: &str = "local";

/// Invisible Ink: hide messages in images.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide a message in an image
    Hide {
        /// Path to the source image
        image: PathBuf,

        /// Message to hide (read from stdin if not provided)
        #[arg(short, long)]
        message: Option<String>,

        /// Path to save the output image (always PNG)
        #[arg(short, long, default_value = "hidden.png")]
        output: PathBuf,

        /// Password to encrypt the message
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Reveal a message from an image
    Reveal {
        /// Path to the image with a hidden message
        image: PathBuf,

        /// Password to decrypt the message
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn read_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn run_hide(
    image: &Path,
    message: Option<String>,
    output: &Path,
    password: Option<&str>,
) -> Result<ExitCode> {
    let message = match message {
        Some(message) => message,
        None => read_line("Enter the message to hide: ")?,
    };

    match hide_file(image, &message, password, output) {
        Ok(outcome) => {
            println!("Success! Output saved to {}", outcome.output_path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Error hiding message: {}", e);
            Ok(ExitCode::from(1))
        }
    }
}

fn run_reveal(service: &InkService, image: &Path, password: Option<String>) -> Result<ExitCode> {
    let mut outcome = service.reveal_file(LOCAL_IDENTITY, image, password.as_deref());

    if let Ok(RevealOutcome::PasswordRequired) = outcome {
        let password = rpassword::prompt_password("This message is encrypted. Enter password: ")
            .context("failed to read password")?;
        outcome = service.reveal_file(LOCAL_IDENTITY, image, Some(&password));
    }

    let code = match outcome {
        Ok(RevealOutcome::Message(message)) => {
            println!("\n--- HIDDEN MESSAGE ---");
            println!("{message}");
            println!("----------------------");
            0
        }
        Ok(RevealOutcome::NoMessageFound) => {
            println!("No hidden message found (or image is corrupted).");
            2
        }
        Ok(RevealOutcome::PasswordRequired) => {
            error!("This message is encrypted and no password was given.");
            3
        }
        Ok(RevealOutcome::WrongPassword) => {
            error!("Wrong password or corrupted data.");
            3
        }
        Ok(RevealOutcome::LockedOut { remaining_secs }) => {
            error!("Too many failed attempts. Try again in {}s.", remaining_secs);
            4
        }
        Err(e) => {
            error!("Error reading image: {}", e);
            1
        }
    };

    Ok(ExitCode::from(code))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logger(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    let config = InkConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Hide {
            image,
            message,
            output,
            password,
        } => run_hide(&image, message, &output, password.as_deref()),
        Command::Reveal { image, password } => {
            let service = InkService::new(config.throttle);
            run_reveal(&service, &image, password)
        }
    }
}
