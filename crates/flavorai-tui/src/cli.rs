//! One-shot commands that run without the full-screen UI.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use flavorai_core::models::LoginRequest;
use flavorai_core::{ApiClient, Config};

use crate::app::open_session_store;
use crate::utils::{pluralize, truncate_string};

/// Width of the title column in `flavorai recipes`
const TITLE_WIDTH: usize = 36;

/// Browse, write and rate FlavorAI recipes from the terminal.
///
/// Without a command the full-screen recipe browser opens.
#[derive(Parser, Debug)]
#[command(
    name = "flavorai",
    version,
    after_help = "Environment: FLAVORAI_API_URL, FLAVORAI_EMAIL, FLAVORAI_PASSWORD, RUST_LOG"
)]
pub struct Cli {
    /// Keep the session in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and remember the session
    Login,
    /// Forget the saved session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List recipes, optionally filtered by a search phrase
    Recipes {
        /// Words to search titles and descriptions for
        search: Vec<String>,
    },
}

impl Command {
    /// Search words joined into one phrase, if there are any.
    fn search_phrase(words: &[String]) -> Option<String> {
        let phrase = words.join(" ");
        let phrase = phrase.trim();
        (!phrase.is_empty()).then(|| phrase.to_string())
    }
}

pub async fn run(command: Command, ephemeral: bool) -> Result<()> {
    let (mut config, config_path) = Config::load_for_update();

    match command {
        Command::Login => login(&mut config, config_path.as_deref(), ephemeral).await,
        Command::Logout => {
            let mut session = open_session_store(&config, ephemeral);
            session.initialize().await;
            session.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            let mut session = open_session_store(&config, ephemeral);
            session.initialize().await;
            match session.identity() {
                Some(identity) => println!("{} (user {})", identity.email, identity.id),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Recipes { search } => {
            list_recipes(&config, Command::search_phrase(&search).as_deref()).await
        }
    }
}

fn api_client(config: &Config) -> Result<ApiClient> {
    let url = config.api_url();
    ApiClient::with_timeout(&url, config.request_timeout())
        .with_context(|| format!("Invalid API URL {}", url))
}

async fn login(config: &mut Config, config_path: Option<&Path>, ephemeral: bool) -> Result<()> {
    let api = api_client(config)?;
    let mut session = open_session_store(config, ephemeral);
    session.initialize().await;

    let default_email = std::env::var("FLAVORAI_EMAIL")
        .ok()
        .or_else(|| config.last_email.clone())
        .unwrap_or_default();
    let email = prompt_line("Email", &default_email)?;
    let password = match std::env::var("FLAVORAI_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let Some(request) = LoginRequest::new(&email, &password) else {
        bail!("Email and password required");
    };

    let response = api.login(&request).await?;
    let email = response.user.email.clone();
    session.login_with(response);
    info!(%email, "Logged in from the command line");

    config.last_email = Some(email.clone());
    if let Some(path) = config_path {
        if let Err(e) = config.save_to(path) {
            warn!(error = %e, "Failed to save config");
        }
    }

    println!("Logged in as {}.", email);
    if ephemeral {
        println!("(--ephemeral: the session was not saved)");
    }
    Ok(())
}

/// Read one line from stdin, returning `default` when left blank.
fn prompt_line(label: &str, default: &str) -> Result<String> {
    let mut stdout = io::stdout();
    if default.is_empty() {
        write!(stdout, "{}: ", label)?;
    } else {
        write!(stdout, "{} [{}]: ", label, default)?;
    }
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    Ok(if line.is_empty() { default } else { line }.to_string())
}

async fn list_recipes(config: &Config, search: Option<&str>) -> Result<()> {
    let api = api_client(config)?;
    let recipes = api.list_recipes(search).await?;

    if recipes.is_empty() {
        match search {
            Some(query) => println!("No recipes match \"{}\".", query),
            None => println!("No recipes yet."),
        }
        return Ok(());
    }

    for recipe in &recipes {
        println!(
            "{:>5}  {:<width$}  {:<12}  {}",
            recipe.id,
            truncate_string(&recipe.title, TITLE_WIDTH),
            truncate_string(recipe.cuisine.as_deref().unwrap_or("-"), 12),
            recipe.rating_display(),
            width = TITLE_WIDTH
        );
    }
    println!();
    println!("{}", pluralize(recipes.len(), "recipe"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("flavorai").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_opens_tui() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.command, None);
        assert!(!cli.ephemeral);
    }

    #[test]
    fn test_ephemeral_is_global() {
        assert!(parse(&["--ephemeral"]).unwrap().ephemeral);

        let cli = parse(&["whoami", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
        assert_eq!(cli.command, Some(Command::Whoami));
    }

    #[test]
    fn test_recipes_search_words_joined() {
        let cli = parse(&["recipes", "mac", "and", "cheese"]).unwrap();
        let Some(Command::Recipes { search }) = cli.command else {
            panic!("expected recipes command");
        };
        assert_eq!(Command::search_phrase(&search).as_deref(), Some("mac and cheese"));

        let cli = parse(&["recipes"]).unwrap();
        let Some(Command::Recipes { search }) = cli.command else {
            panic!("expected recipes command");
        };
        assert_eq!(Command::search_phrase(&search), None);
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(parse(&["cook"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
        assert!(parse(&["login", "extra"]).is_err());
    }
}
