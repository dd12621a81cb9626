use std::fmt;

use chrono::{DateTime, Duration, Utc};
use progress_core::model::{
    Category, CategoryId, Level, ProgressRecord, Question, QuestionId, UserId,
};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    categories: u32,
    questions_per_category: u32,
    user_id: UserId,
    solve_every: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_u32(flag: &'static str, raw: &str) -> Result<u32, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: raw.to_string() })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PROGRESS_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut categories = 4;
        let mut questions_per_category = 10;
        let mut user_id = UserId::new(1);
        let mut solve_every = 3;
        let mut now = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = require_value(&mut args, "--db")?,
                "--categories" => {
                    categories = parse_u32("--categories", &require_value(&mut args, "--categories")?)?;
                }
                "--questions" => {
                    questions_per_category =
                        parse_u32("--questions", &require_value(&mut args, "--questions")?)?;
                }
                "--user" => {
                    user_id = UserId::new(u64::from(parse_u32(
                        "--user",
                        &require_value(&mut args, "--user")?,
                    )?));
                }
                "--solve-every" => {
                    solve_every =
                        parse_u32("--solve-every", &require_value(&mut args, "--solve-every")?)?;
                }
                "--now" => {
                    let raw = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&raw)
                        .map_err(|_| ArgsError::InvalidNow { raw })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            categories,
            questions_per_category,
            user_id,
            solve_every,
            now,
        })
    }
}

fn level_for(index: u32) -> Level {
    match index % 3 {
        0 => Level::Easy,
        1 => Level::Medium,
        _ => Level::Hard,
    }
}

async fn seed(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut question_id = 1u64;
    for c in 1..=u64::from(args.categories) {
        let category = Category::new(CategoryId::new(c), format!("Category {c}"))?;
        storage.catalog.upsert_category(&category).await?;

        for q in 0..args.questions_per_category {
            let question = Question::new(
                QuestionId::new(question_id),
                category.id(),
                format!("Question {question_id}"),
                level_for(q),
            )?;
            storage.catalog.upsert_question(&question).await?;

            if args.solve_every > 0 && question_id % u64::from(args.solve_every) == 0 {
                let mut record =
                    ProgressRecord::new(args.user_id, question.id(), question.level());
                // Spread solves over past days so streak/recency have data.
                record.mark_solved(now - Duration::days(i64::from(q % 5)));
                storage.progress.upsert(&record).await?;
            }

            question_id += 1;
        }
    }

    println!(
        "seeded {} categories, {} questions into {}",
        args.categories,
        u64::from(args.categories) * u64::from(args.questions_per_category),
        args.db_url
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("seed: {err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = seed(&args).await {
        eprintln!("seed: {err}");
        std::process::exit(1);
    }
}
