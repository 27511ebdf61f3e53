//! Non-interactive commands: authenticate, run one request, print JSON.
//!
//! Credentials come from `SORACOM_AUTH_KEY_ID` / `SORACOM_AUTH_KEY` (or the
//! config file for the id) and are prompted for on the terminal when unset.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::info;

use simsearch_core::config::ENV_AUTH_KEY;
use simsearch_core::{ApiClient, Config, SimFilter, SimQuery};

use crate::app::LOGIN_FAILED_MESSAGE;

pub const USAGE: &str = "\
Usage: simsearch [COMMAND]

With no command, starts the interactive terminal UI.

Commands:
  --search <filter> <value>  Search SIMs and print them as JSON
                             filter: name, group, tag, status,
                                     sessionStatus, subscriptionStatus
  --get <simId>              Fetch a single SIM and print it as JSON
  --help                     Show this message

Environment:
  SORACOM_AUTH_KEY_ID, SORACOM_AUTH_KEY, SORACOM_COVERAGE (g or jp)
";

/// A parsed command line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Interactive,
    Help,
    Search { filter: SimFilter, value: String },
    Get { sim_id: String },
}

impl Command {
    /// Parse arguments (without the program name)
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let command = match args.next() {
            None => Command::Interactive,
            Some("--help") | Some("-h") => Command::Help,
            Some("--search") => {
                let filter = args
                    .next()
                    .ok_or_else(|| anyhow!("--search requires <filter> <value>"))?;
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--search requires <filter> <value>"))?;
                Command::Search {
                    filter: SimFilter::from_str(filter)?,
                    value: value.to_string(),
                }
            }
            Some("--get") => {
                let sim_id = args.next().ok_or_else(|| anyhow!("--get requires <simId>"))?;
                Command::Get {
                    sim_id: sim_id.to_string(),
                }
            }
            Some(other) => return Err(anyhow!("Unknown argument: {}\n\n{}", other, USAGE)),
        };

        if let Some(extra) = args.next() {
            return Err(anyhow!("Unexpected argument: {}", extra));
        }
        Ok(command)
    }
}

/// Run a headless command to completion
pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Interactive => Ok(()),
        Command::Help => {
            print!("{}", USAGE);
            Ok(())
        }
        Command::Search { filter, value } => {
            let query = SimQuery::try_new(filter, &value)?;
            let api = login(config).await?;
            let sims = api.search_sims(&query).await?;
            info!(count = sims.len(), query = %query, "Search complete");
            print_json(&sims)
        }
        Command::Get { sim_id } => {
            let api = login(config).await?;
            let sim = api.get_sim(&sim_id).await?;
            print_json(&sim)
        }
    }
}

async fn login(config: &Config) -> Result<ApiClient> {
    let auth_key_id = match config.auth_key_id {
        Some(ref id) => id.clone(),
        None => prompt_line("Auth key ID: ")?,
    };
    let auth_key = match std::env::var(ENV_AUTH_KEY) {
        Ok(key) if !key.is_empty() => key,
        _ => rpassword::prompt_password("Auth key: ").context("Failed to read auth key")?,
    };

    let client = ApiClient::with_options(config.client_options())?;
    let coverage = config.default_coverage();
    let credentials = client
        .authenticate(&auth_key_id, &auth_key, coverage.selector())
        .await
        .context(LOGIN_FAILED_MESSAGE)?;

    Ok(client.with_credentials(credentials))
}

fn prompt_line(prompt: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", prompt)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_args_is_interactive() {
        assert_eq!(Command::parse(&[]).expect("parse"), Command::Interactive);
    }

    #[test]
    fn test_parse_search() {
        let command = Command::parse(&args(&["--search", "subscriptionStatus", "plan01s"]))
            .expect("parse");
        assert_eq!(
            command,
            Command::Search {
                filter: SimFilter::SubscriptionStatus,
                value: "plan01s".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_get() {
        let command = Command::parse(&args(&["--get", "8981100000000000000"])).expect("parse");
        assert_eq!(
            command,
            Command::Get {
                sim_id: "8981100000000000000".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(&args(&["--search", "name"])).is_err());
        assert!(Command::parse(&args(&["--search", "imei", "x"])).is_err());
        assert!(Command::parse(&args(&["--get"])).is_err());
        assert!(Command::parse(&args(&["--get", "a", "b"])).is_err());
        assert!(Command::parse(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(Command::parse(&args(&["--help"])).expect("parse"), Command::Help);
    }
}
