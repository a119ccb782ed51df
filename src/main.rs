// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use teacher_portal::{
    client::{HttpClient, PortalApi},
    config::Config,
    error::{ApiError, GradingError},
    grading::{DraftField, GradingWorkflow},
    models::SubmissionStatus,
    page::{StudentPage, StudentRoute},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: teacher-portal <student_id> <class_id> <subject_id> \
                     [<submission_id> <submitted|completed|rejected> [marks|remarks]]";

/// A grading edit requested on the command line.
struct GradeArgs {
    submission_id: String,
    status: SubmissionStatus,
    value: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (.env included)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((route, grade)) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    // Token storage lives outside this program; the shell only reads it.
    let token = std::env::var("PORTAL_TOKEN").unwrap_or_default();
    if token.trim().is_empty() {
        tracing::error!("PORTAL_TOKEN is not set, please log in first");
        return ExitCode::FAILURE;
    }

    let api: Arc<dyn PortalApi> = match HttpClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let page = match StudentPage::load(api.as_ref(), route, &token).await {
        Ok(page) => page,
        Err(ApiError::Auth(msg)) => {
            tracing::error!("{}. Please log in again.", msg);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", page.heading());
    let workflow = page.into_workflow(api).with_notice_ttl(config.notice_ttl);

    if let Some(grade) = grade {
        if let Err(e) = apply_grade(&workflow, grade, &token).await {
            tracing::error!("{}", e);
            print_table(&workflow).await;
            return ExitCode::FAILURE;
        }
    }

    print_table(&workflow).await;
    ExitCode::SUCCESS
}

/// Logs to stdout and to a daily file under `log_dir`. Keep the guard alive
/// for the whole run or buffered file lines are lost.
fn init_tracing(config: &Config) -> WorkerGuard {
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&config.log_dir, "portal.log"));

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.rust_log))
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    guard
}

fn parse_args(args: &[String]) -> Option<(StudentRoute, Option<GradeArgs>)> {
    let route = StudentRoute::new(args.first()?, args.get(1)?, args.get(2)?)?;
    let grade = match args.get(3) {
        None => None,
        Some(submission_id) => Some(GradeArgs {
            submission_id: submission_id.clone(),
            status: SubmissionStatus::parse(args.get(4)?)?,
            value: args.get(5).cloned(),
        }),
    };
    Some((route, grade))
}

async fn apply_grade(
    workflow: &GradingWorkflow,
    grade: GradeArgs,
    token: &str,
) -> Result<(), GradingError> {
    workflow.open_draft(&grade.submission_id).await?;
    workflow
        .update_draft_field(DraftField::Status(grade.status))
        .await?;

    match (grade.status, grade.value) {
        (SubmissionStatus::Completed, Some(raw)) => {
            // Unparseable input is left to validation, like an empty number field.
            let marks = raw.trim().parse::<f64>().ok();
            workflow.update_draft_field(DraftField::Marks(marks)).await?;
        }
        (SubmissionStatus::Rejected, Some(remarks)) => {
            workflow
                .update_draft_field(DraftField::Remarks(remarks))
                .await?;
        }
        _ => {}
    }

    workflow.save_draft(token).await?;
    if let Some(notice) = workflow.notice().await {
        println!("{}", notice);
    }
    Ok(())
}

async fn print_table(workflow: &GradingWorkflow) {
    let submissions = workflow.submissions().await;
    if submissions.is_empty() {
        println!("No practical submissions found.");
        return;
    }

    println!(
        "{:<12} {:<20} {:<12} {:<10} {:<8} {}",
        "ID", "PRACTICAL", "SUBMITTED", "STATUS", "MARKS", "LINK"
    );
    for s in submissions {
        println!(
            "{:<12} {:<20} {:<12} {:<10} {:<8} {}",
            s.id,
            s.name,
            s.submitted_at.format("%Y-%m-%d").to_string(),
            s.status,
            s.marks_label(),
            s.link
        );
    }
}
