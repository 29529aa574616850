use clap::{Parser, Subcommand};
use medquery_core::{load_records, profile_for, QueryRouter, SearchCriteria};
use medquery_types::{PatientRecord, Role, User};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medquery")]
#[command(about = "Role-based patient query CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one free-text query
    Query {
        /// Role to run the query as (doctor, researcher, marketing, intern)
        #[arg(long)]
        role: Role,
        /// Path to the patient data JSON file
        #[arg(long, default_value = "data/mock_patients.json")]
        data: PathBuf,
        /// The query text
        text: Vec<String>,
    },
    /// Print population statistics
    Stats {
        /// Role to run as
        #[arg(long)]
        role: Role,
        /// Path to the patient data JSON file
        #[arg(long, default_value = "data/mock_patients.json")]
        data: PathBuf,
    },
    /// Summarise one patient by id or name
    Summarize {
        /// Role to run as
        #[arg(long)]
        role: Role,
        /// Path to the patient data JSON file
        #[arg(long, default_value = "data/mock_patients.json")]
        data: PathBuf,
        /// Patient id or name
        patient: String,
        /// Maximum summary length in characters
        #[arg(long)]
        max_len: Option<usize>,
    },
    /// Search for patients matching criteria
    Find {
        /// Role to run as
        #[arg(long)]
        role: Role,
        /// Path to the patient data JSON file
        #[arg(long, default_value = "data/mock_patients.json")]
        data: PathBuf,
        /// Minimum age
        #[arg(long)]
        min_age: Option<u16>,
        /// Maximum age
        #[arg(long)]
        max_age: Option<u16>,
        /// Gender (exact match, case-insensitive)
        #[arg(long)]
        gender: Option<String>,
        /// Required condition keyword (repeatable)
        #[arg(long = "condition")]
        conditions: Vec<String>,
        /// Required medication keyword (repeatable)
        #[arg(long = "medication")]
        medications: Vec<String>,
    },
    /// List roles and their capabilities
    Roles,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Query { role, data, text }) => {
            let records = load_records(&data)?;
            let user = cli_user(role);
            let router = QueryRouter::new();
            let result = router.process(&user, &records, &text.join(" "));
            print_result_message(&result.message, result.success);
            print_audit(result.redacted_fields.as_deref());
        }
        Some(Commands::Stats { role, data }) => {
            let records = load_records(&data)?;
            let result = medquery_core::population_stats(&cli_user(role), &records);
            print_result_message(&result.message, result.success);
        }
        Some(Commands::Summarize {
            role,
            data,
            patient,
            max_len,
        }) => {
            let records = load_records(&data)?;
            let user = cli_user(role);
            match find_patient(&records, &patient) {
                Some(record) => {
                    let result = medquery_core::summarize_patient(&user, record, max_len);
                    print_result_message(&result.message, result.success);
                    print_audit(result.redacted_fields.as_deref());
                }
                None => eprintln!("No patient matches '{patient}'."),
            }
        }
        Some(Commands::Find {
            role,
            data,
            min_age,
            max_age,
            gender,
            conditions,
            medications,
        }) => {
            let records = load_records(&data)?;
            let criteria = SearchCriteria {
                min_age,
                max_age,
                gender,
                conditions,
                medications,
            };
            let result =
                medquery_core::find_by_criteria(&cli_user(role), &records, &criteria);
            print_result_message(&result.message, result.success);
        }
        Some(Commands::Roles) => {
            for role in Role::ALL {
                let profile = profile_for(role);
                println!(
                    "{role}: individual={} identifying={} aggregate={} fields={}",
                    profile.can_view_individual,
                    profile.can_view_identifying,
                    profile.can_view_aggregate,
                    profile
                        .allowed_fields
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                );
            }
        }
        None => {
            println!("Use 'medquery --help' for commands");
        }
    }

    Ok(())
}

fn cli_user(role: Role) -> User {
    User::new("cli", "CLI User", role)
}

fn find_patient<'a>(records: &'a [PatientRecord], key: &str) -> Option<&'a PatientRecord> {
    records
        .iter()
        .find(|r| r.id.as_str().eq_ignore_ascii_case(key.trim()))
        .or_else(|| records.iter().find(|r| r.name.eq_ignore_ascii_case(key.trim())))
}

fn print_result_message(message: &str, success: bool) {
    if success {
        println!("{message}");
    } else {
        eprintln!("{message}");
    }
}

fn print_audit(redacted: Option<&[medquery_types::Field]>) {
    if let Some(fields) = redacted {
        if !fields.is_empty() {
            let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
            println!("(redacted fields: {})", names.join(", "));
        }
    }
}
