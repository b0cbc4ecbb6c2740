//! Command-line front end for the review store.
//!
//! # Responsibility
//! - Map subcommands onto `review_core` repository operations.
//! - Resolve database and logging settings from flags or environment.

use clap::{Args, Parser, Subcommand};
use log::info;
use review_core::db::open_db;
use review_core::{
    default_log_level, init_logging, parse_year, ReviewHandle, ReviewRepository,
    SqliteEmployeeDirectory, SqliteReviewRepository,
};
use std::error::Error;
use std::path::PathBuf;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "reviews", version)]
#[command(about = "Employee performance reviews backed by SQLite", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "REVIEWS_DB", default_value = "reviews.db", global = true)]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "REVIEWS_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "REVIEWS_LOG_DIR", global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the reviews table if missing
    Init,
    /// Add an employee that reviews can reference
    AddEmployee(AddEmployeeArgs),
    /// Create and persist a review
    Create(CreateArgs),
    /// Show one review
    Show { id: i64 },
    /// List every review
    List,
    /// Change fields of an existing review
    Update(UpdateArgs),
    /// Delete one review
    Delete { id: i64 },
    /// Drop the reviews table
    Drop,
}

impl Commands {
    /// Stable name for log events; arguments are never logged.
    fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::AddEmployee(_) => "add-employee",
            Self::Create(_) => "create",
            Self::Show { .. } => "show",
            Self::List => "list",
            Self::Update(_) => "update",
            Self::Delete { .. } => "delete",
            Self::Drop => "drop",
        }
    }
}

#[derive(Debug, Args)]
struct AddEmployeeArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    job_title: String,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Review year, 2000 or later
    #[arg(long)]
    year: String,
    #[arg(long)]
    summary: String,
    #[arg(long)]
    employee_id: i64,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: i64,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    summary: Option<String>,
    #[arg(long)]
    employee_id: Option<i64>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let conn = open_db(&cli.db)?;
    let mut repo = SqliteReviewRepository::new(&conn);
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    match cli.command {
        Commands::Init => {
            repo.create_table()?;
            println!("reviews table ready");
        }
        Commands::AddEmployee(args) => {
            let employees = SqliteEmployeeDirectory::new(&conn);
            let id = employees.add_employee(&args.name, &args.job_title)?;
            println!("employee {id}");
        }
        Commands::Create(args) => {
            let year = parse_year(&args.year)?;
            let review = repo.create(year, &args.summary, args.employee_id)?;
            print_review(&review);
        }
        Commands::Show { id } => match repo.find_by_id(id)? {
            Some(review) => print_review(&review),
            None => return Err(format!("review {id} not found").into()),
        },
        Commands::List => {
            for review in repo.get_all()? {
                print_review(&review);
            }
        }
        Commands::Update(args) => update(&mut repo, args)?,
        Commands::Delete { id } => {
            let review = repo
                .find_by_id(id)?
                .ok_or_else(|| format!("review {id} not found"))?;
            repo.delete(&review)?;
            println!("deleted review {id}");
        }
        Commands::Drop => {
            repo.drop_table()?;
            println!("reviews table dropped");
        }
    }

    Ok(())
}

fn update(repo: &mut SqliteReviewRepository<'_>, args: UpdateArgs) -> CliResult {
    let handle = repo
        .find_by_id(args.id)?
        .ok_or_else(|| format!("review {} not found", args.id))?;

    {
        let mut review = handle.borrow_mut();
        if let Some(year) = args.year.as_deref() {
            review.set_year(parse_year(year)?)?;
        }
        if let Some(summary) = args.summary {
            review.set_summary(summary)?;
        }
        if let Some(employee_id) = args.employee_id {
            review.set_employee_id(employee_id, repo.employees())?;
        }
    }

    repo.update(&handle)?;
    print_review(&handle);
    Ok(())
}

fn print_review(review: &ReviewHandle) {
    println!("{}", review.borrow());
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn command_name_omits_review_text() {
        let cli = Cli::try_parse_from([
            "reviews",
            "create",
            "--year",
            "2023",
            "--summary",
            "Private feedback",
            "--employee-id",
            "1",
        ])
        .unwrap();

        let name = cli.command.name();
        assert_eq!(name, "create");
        assert!(!name.contains("Private feedback"));
    }

    #[test]
    fn command_names_match_subcommands() {
        for (args, expected) in [
            (vec!["reviews", "init"], "init"),
            (vec!["reviews", "list"], "list"),
            (vec!["reviews", "show", "3"], "show"),
            (vec!["reviews", "delete", "3"], "delete"),
            (vec!["reviews", "update", "3", "--summary", "x"], "update"),
            (
                vec!["reviews", "add-employee", "--name", "Ada", "--job-title", "Eng"],
                "add-employee",
            ),
            (vec!["reviews", "drop"], "drop"),
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.command.name(), expected);
        }
    }
}
