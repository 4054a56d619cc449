use clap::{Parser, Subcommand};
use serde::Serialize;

use igs_api::client::{ApiClient, ClientError};

#[derive(Parser)]
#[command(name = "igs-cli")]
#[command(about = "Command-line client for the IGS API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[arg(long, env = "IGS_USERNAME")]
    username: String,

    #[arg(long, env = "IGS_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List census tracts
    Tracts {
        /// Only tracts with at least this inclusion score
        #[arg(long)]
        min_inclusion: Option<f64>,
    },
    /// Show one census tract
    Tract { census_tract: String },
    /// Show the logged-in user
    Whoami,
    /// Average scores of low- and high-income tracts
    Summary,
}

/// Exit status when the login is rejected.
const EXIT_REJECTED: i32 = 1;
/// Exit status when the requested tract does not exist.
const EXIT_NOT_FOUND: i32 = 2;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.url);

    let token = match client.login(&cli.username, &cli.password).await {
        Ok(token) => token.access_token,
        Err(e) => match fail(e)? {},
    };

    match cli.command {
        Commands::Tracts { min_inclusion } => print(client.list_tracts(&token, min_inclusion).await)?,
        Commands::Tract { census_tract } => print(client.get_tract(&token, &census_tract).await)?,
        Commands::Whoami => print(client.whoami(&token).await)?,
        Commands::Summary => print(client.income_summary(&token).await)?,
    }

    Ok(())
}

fn print<T: Serialize>(result: Result<T, ClientError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(e) => match fail(e)? {},
    }
    Ok(())
}

/// Exit with a dedicated status for expected failures; pass the rest up.
fn fail(err: ClientError) -> Result<std::convert::Infallible, Box<dyn std::error::Error>> {
    match exit_code(&err) {
        Some(code) => {
            eprintln!("Error: {err}");
            std::process::exit(code);
        }
        None => Err(err.into()),
    }
}

fn exit_code(err: &ClientError) -> Option<i32> {
    match err {
        ClientError::Unauthorized => Some(EXIT_REJECTED),
        ClientError::NotFound(_) => Some(EXIT_NOT_FOUND),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misses_and_rejections_exit_non_zero() {
        assert_eq!(exit_code(&ClientError::NotFound("06037123456".into())), Some(EXIT_NOT_FOUND));
        assert_eq!(exit_code(&ClientError::Unauthorized), Some(EXIT_REJECTED));
    }

    #[test]
    fn server_errors_are_propagated() {
        let err = ClientError::Status {
            status: 500,
            body: "Internal server error".into(),
        };
        assert_eq!(exit_code(&err), None);
    }
}
