use std::io::{BufRead, Write};
use std::path::PathBuf;

use medquery_core::{load_records, QueryRouter};
use medquery_types::{Role, User};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Runtime configuration resolved once at startup.
///
/// Environment variables are read here and nowhere else, so query handling
/// never depends on ambient process state.
struct RunConfig {
    data_file: PathBuf,
}

impl RunConfig {
    fn from_env() -> Self {
        let data_file = std::env::var("MEDQUERY_DATA_FILE")
            .unwrap_or_else(|_| "data/mock_patients.json".into());
        Self {
            data_file: PathBuf::from(data_file),
        }
    }
}

/// Main entry point for the interactive MedQuery session.
///
/// Loads the patient record set once, then reads queries from stdin. The
/// active user is session state owned here, never by the core; switching
/// users re-routes subsequent queries under the new role.
///
/// # Environment Variables
/// - `MEDQUERY_DATA_FILE`: patient data JSON file (default: "data/mock_patients.json")
///
/// # Session commands
/// - `user <role> <display name>`: select the active user
/// - `json`: toggle printing of the structured result payload
/// - `quit` / `exit`: leave the session
/// - anything else: routed as a query for the active user
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medquery=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunConfig::from_env();
    let records = load_records(&config.data_file)?;
    tracing::info!(count = records.len(), "patient records loaded");
    println!("Loaded {} patient records from {}", records.len(), config.data_file.display());
    println!("Select a user with: user <doctor|researcher|marketing|intern> <name>");

    let router = QueryRouter::new();
    let mut active_user: Option<User> = None;
    let mut show_payload = false;

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        write!(stdout, "medquery> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "json" {
            show_payload = !show_payload;
            println!("Payload printing {}", if show_payload { "on" } else { "off" });
            continue;
        }
        if let Some(rest) = line.strip_prefix("user ") {
            match parse_user(rest) {
                Ok(user) => {
                    println!("Active user: {} ({})", user.name, user.role);
                    active_user = Some(user);
                }
                Err(reason) => eprintln!("{reason}"),
            }
            continue;
        }

        let Some(user) = &active_user else {
            eprintln!("No active user. Select one with: user <role> <name>");
            continue;
        };

        let result = router.process(user, &records, line);
        println!("{}", result.message);
        println!("[access level: {}]", result.access_level);
        if let Some(redacted) = &result.redacted_fields {
            if !redacted.is_empty() {
                let names: Vec<&str> = redacted.iter().map(|f| f.as_str()).collect();
                println!("[redacted fields: {}]", names.join(", "));
            }
        }
        if show_payload {
            if let Some(data) = &result.data {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
        }
    }

    Ok(())
}

/// Parse "user <role> <display name>" arguments.
fn parse_user(rest: &str) -> Result<User, String> {
    let mut parts = rest.splitn(2, ' ');
    let role: Role = parts
        .next()
        .ok_or_else(|| "Usage: user <role> <name>".to_string())?
        .parse()?;
    let name = parts.next().unwrap_or("Session User").trim();
    let name = if name.is_empty() { "Session User" } else { name };
    Ok(User::new("session", name, role))
}
