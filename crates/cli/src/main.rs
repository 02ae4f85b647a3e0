use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use hospital_core::config::{data_dir_from_env_value, strategy_from_env_value};
use hospital_core::constants::{DATA_DIR_ENV, DATA_MODE_ENV};
use hospital_core::{
    timestamp, CoreConfig, Environment, EnvironmentConfiguration, KeyedRecord, LoadError,
    Patient, PathStrategy, Session, StoreRegistry, Supervisor,
};
use hospital_uuid::RecordId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hospital")]
#[command(about = "Hospital rehabilitation data store CLI")]
struct Cli {
    /// Data directory (overrides HOSPITAL_DATA_DIR and the path strategy)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Path strategy: development or packaged (overrides HOSPITAL_DATA_MODE)
    #[arg(long, global = true)]
    mode: Option<PathStrategy>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the data directory and the state of each collection
    Info,
    /// Manage patients
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Manage supervisors
    #[command(subcommand)]
    Supervisors(SupervisorCommands),
    /// Manage therapy sessions
    #[command(subcommand)]
    Sessions(SessionCommands),
    /// Manage environment presets
    #[command(subcommand)]
    Environments(EnvironmentCommands),
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List all patients
    List,
    /// Show one patient and their sessions
    Show { id: String },
    /// Add a patient
    Add {
        last_name: String,
        first_name: String,
        birth_year: i32,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        sex: String,
        #[arg(long, default_value = "")]
        pathology: String,
        /// Neglected side
        #[arg(long, default_value = "")]
        side: String,
    },
    /// Replace the follow-up note of a patient
    Note { id: String, note: String },
    /// Remove a patient and all of their sessions
    Remove { id: String },
}

#[derive(Subcommand)]
enum SupervisorCommands {
    /// List all supervisors
    List,
    /// Add a supervisor
    Add {
        last_name: String,
        first_name: String,
        role: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a supervisor
    Remove { id: String },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions, optionally for one patient
    List {
        #[arg(long)]
        patient: Option<String>,
    },
    /// Record a session in an environment preset
    Start(StartSession),
    /// Remove one session by patient id and start timestamp
    Remove { patient: String, started_at: String },
    /// Remove every session of a patient
    Purge { patient: String },
}

#[derive(Args)]
struct StartSession {
    patient: String,
    environment: String,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long, default_value_t = 0)]
    assistance: i32,
    /// Duration in seconds (defaults to the preset's)
    #[arg(long)]
    duration: Option<i32>,
    #[arg(long)]
    supervisor: Option<String>,
    #[arg(long, default_value_t = 0)]
    score: i32,
    #[arg(long, default_value = "")]
    comment: String,
}

#[derive(Subcommand)]
enum EnvironmentCommands {
    /// List all environment presets
    List,
    /// Add an environment preset
    Add {
        name: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Available start positions (comma-separated)
        #[arg(long, value_delimiter = ',')]
        positions: Vec<String>,
        /// Difficulty levels (comma-separated)
        #[arg(long, value_delimiter = ',')]
        levels: Vec<String>,
        #[arg(long)]
        duration: Option<i32>,
    },
    /// Remove an environment preset
    Remove { id: String },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hospital_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let strategy = match cli.mode {
        Some(mode) => mode,
        None => strategy_from_env_value(std::env::var(DATA_MODE_ENV).ok())?,
    };
    let override_dir = cli
        .data_dir
        .or_else(|| data_dir_from_env_value(std::env::var(DATA_DIR_ENV).ok()));
    let cfg = CoreConfig::resolve(strategy, override_dir)?;
    tracing::debug!(base_dir = %cfg.base_dir().display(), %strategy, "resolved data directory");

    let registry = StoreRegistry::new(Arc::new(cfg));

    match cli.command {
        Some(Commands::Info) => info(&registry, strategy),
        Some(Commands::Patients(command)) => patients(&registry, command)?,
        Some(Commands::Supervisors(command)) => supervisors(&registry, command)?,
        Some(Commands::Sessions(command)) => sessions(&registry, command)?,
        Some(Commands::Environments(command)) => environments(&registry, command)?,
        None => {
            println!("Use 'hospital --help' for commands");
        }
    }

    Ok(())
}

fn info(registry: &StoreRegistry, strategy: PathStrategy) {
    println!("Data directory: {} ({strategy})", registry.base_dir().display());

    let collections: [(&str, usize, Option<LoadError>); 4] = [
        (
            "patients",
            registry.patients().len(),
            registry.patients().last_load_error(),
        ),
        (
            "supervisors",
            registry.supervisors().len(),
            registry.supervisors().last_load_error(),
        ),
        (
            "sessions",
            registry.sessions().len(),
            registry.sessions().last_load_error(),
        ),
        (
            "environments",
            registry.environments().len(),
            registry.environments().last_load_error(),
        ),
    ];

    for (name, count, error) in collections {
        match error {
            Some(e) => println!("  {name}: {count} (load failed: {e})"),
            None => println!("  {name}: {count}"),
        }
    }
}

fn patients(registry: &StoreRegistry, command: PatientCommands) -> anyhow::Result<()> {
    let store = registry.patients();

    match command {
        PatientCommands::List => {
            let patients = store.get_all();
            if patients.is_empty() {
                println!("No patients found.");
            }
            for p in patients {
                println!(
                    "ID: {}, Name: {} {}, Born: {}, Created: {}",
                    p.id,
                    p.first_name,
                    p.last_name,
                    p.birth_year,
                    timestamp::format(&p.created_at)
                );
            }
        }
        PatientCommands::Show { id } => {
            let Some(p) = store.get_by_id(&id) else {
                bail!("patient '{id}' not found");
            };
            println!("ID: {}", p.id);
            println!("Name: {} {}", p.first_name, p.last_name);
            println!("Born: {}", p.birth_year);
            println!("Sex: {}", p.sex);
            println!("Pathology: {}", p.pathology);
            println!("Neglected side: {}", p.neglected_side);
            println!("Created: {}", timestamp::format(&p.created_at));
            println!("Follow-up: {}", p.follow_up);

            let sessions = registry.sessions().get_by_patient(&p.id);
            println!("Sessions: {}", sessions.len());
            for s in sessions {
                print_session(&s);
            }
        }
        PatientCommands::Add {
            last_name,
            first_name,
            birth_year,
            id,
            sex,
            pathology,
            side,
        } => {
            let patient = Patient {
                id: id.unwrap_or_default(),
                sex,
                pathology,
                neglected_side: side,
                ..Patient::new(last_name, first_name, birth_year)
            };
            let stored = store.add(patient)?;
            println!("Added patient {}", describe_id(&stored));
        }
        PatientCommands::Note { id, note } => {
            if !store.update_follow_up_note(&id, &note)? {
                bail!("patient '{id}' not found");
            }
            println!("Updated follow-up note for patient {id}");
        }
        PatientCommands::Remove { id } => {
            if !store.remove(&id)? {
                bail!("patient '{id}' not found");
            }
            println!("Removed patient {id} and their sessions");
        }
    }

    Ok(())
}

fn supervisors(registry: &StoreRegistry, command: SupervisorCommands) -> anyhow::Result<()> {
    let store = registry.supervisors();

    match command {
        SupervisorCommands::List => {
            let supervisors = store.get_all();
            if supervisors.is_empty() {
                println!("No supervisors found.");
            }
            for s in supervisors {
                println!(
                    "ID: {}, Name: {} {}, Role: {}",
                    s.id, s.first_name, s.last_name, s.role
                );
            }
        }
        SupervisorCommands::Add {
            last_name,
            first_name,
            role,
            id,
        } => {
            let supervisor = Supervisor {
                id: id.unwrap_or_default(),
                ..Supervisor::new(last_name, first_name, role)
            };
            let stored = store.add(supervisor)?;
            println!("Added supervisor {}", describe_id(&stored));
        }
        SupervisorCommands::Remove { id } => {
            if !store.remove(&id)? {
                bail!("supervisor '{id}' not found");
            }
            println!("Removed supervisor {id}");
        }
    }

    Ok(())
}

fn sessions(registry: &StoreRegistry, command: SessionCommands) -> anyhow::Result<()> {
    let store = registry.sessions();

    match command {
        SessionCommands::List { patient } => {
            let sessions = match patient {
                Some(patient_id) => store.get_by_patient(&patient_id),
                None => store.get_all(),
            };
            if sessions.is_empty() {
                println!("No sessions found.");
            }
            for s in sessions {
                print_session(&s);
            }
        }
        SessionCommands::Start(start) => {
            let Some(environment) = registry.environments().get_by_id(&start.environment) else {
                bail!("environment '{}' not found", start.environment);
            };
            let configuration = configure(&environment, &start)?;

            let session = Session {
                supervisor_id: start.supervisor.unwrap_or_default(),
                total_score: start.score,
                comment: start.comment,
                ..Session::from_configuration(start.patient, &configuration)
            };
            let stored = store.add(session)?;
            println!(
                "Recorded session for patient {} at {}",
                stored.patient_id,
                timestamp::format(&stored.started_at)
            );
        }
        SessionCommands::Remove {
            patient,
            started_at,
        } => {
            let Some(started_at) = timestamp::parse_lenient(&started_at) else {
                bail!("invalid timestamp '{started_at}'");
            };
            if !store.remove(&patient, &started_at)? {
                bail!(
                    "no session for patient '{patient}' started at {}",
                    timestamp::format(&started_at)
                );
            }
            println!("Removed session");
        }
        SessionCommands::Purge { patient } => {
            let removed = store.remove_all_by_patient(&patient)?;
            println!("Removed {removed} session(s) of patient {patient}");
        }
    }

    Ok(())
}

fn environments(registry: &StoreRegistry, command: EnvironmentCommands) -> anyhow::Result<()> {
    let store = registry.environments();

    match command {
        EnvironmentCommands::List => {
            let environments = store.get_all();
            if environments.is_empty() {
                println!("No environments found.");
            }
            for e in environments {
                println!(
                    "ID: {}, Name: {}, Positions: [{}], Levels: [{}], Duration: {}s",
                    e.id,
                    e.name,
                    e.start_positions.join(", "),
                    e.difficulty_levels.join(", "),
                    e.default_duration_secs
                );
            }
        }
        EnvironmentCommands::Add {
            name,
            id,
            description,
            positions,
            levels,
            duration,
        } => {
            let mut environment = Environment {
                id: id.unwrap_or_default(),
                name,
                description,
                start_positions: positions,
                difficulty_levels: levels,
                ..Environment::default()
            };
            if let Some(duration) = duration {
                environment.default_duration_secs = duration;
            }
            let stored = store.add(environment)?;
            println!("Added environment {}", describe_id(&stored));
        }
        EnvironmentCommands::Remove { id } => {
            if !store.remove(&id)? {
                bail!("environment '{id}' not found");
            }
            println!("Removed environment {id}");
        }
    }

    Ok(())
}

fn configure(
    environment: &Environment,
    start: &StartSession,
) -> anyhow::Result<EnvironmentConfiguration> {
    let mut configuration = EnvironmentConfiguration::for_environment(environment)
        .with_assistance_level(start.assistance);

    if let Some(position) = &start.position {
        configuration = configuration
            .with_position(environment, position)
            .context("invalid --position")?;
    }
    if let Some(difficulty) = &start.difficulty {
        configuration = configuration
            .with_difficulty(environment, difficulty)
            .context("invalid --difficulty")?;
    }
    if let Some(duration) = start.duration {
        configuration = configuration.with_duration(duration);
    }

    Ok(configuration)
}

/// Renders a stored id, noting whether the store generated it.
fn describe_id<R: KeyedRecord>(record: &R) -> String {
    match RecordId::parse(record.id()) {
        Some(parsed) if parsed.prefix() == R::ID_PREFIX => format!("{} (generated)", record.id()),
        _ => record.id().to_string(),
    }
}

fn print_session(s: &Session) {
    let supervisor = if s.has_supervisor() {
        s.supervisor_id.as_str()
    } else {
        "-"
    };
    println!(
        "Patient: {}, Started: {}, Environment: {}, Position: {}, Difficulty: {}, Duration: {}s, Score: {}, Supervisor: {}",
        s.patient_id,
        timestamp::format(&s.started_at),
        s.environment_id,
        s.start_position,
        s.difficulty,
        s.duration_secs,
        s.total_score,
        supervisor
    );
}
