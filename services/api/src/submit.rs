use applicant_intake::config::AppConfig;
use applicant_intake::error::AppError;
use applicant_intake::form::{
    ApplicantForm, Feedback, FeedbackMode, HttpGatewayClient, SelectedFile, SubmissionForm,
    SubmissionOutcome,
};
use applicant_intake::telemetry;
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Base URL of a running intake service
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub(crate) api_base: String,
    #[arg(long)]
    pub(crate) first_name: String,
    #[arg(long)]
    pub(crate) last_name: String,
    #[arg(long)]
    pub(crate) occupation: String,
    #[arg(long)]
    pub(crate) residence: String,
    /// PDF to upload; the content type is guessed from the extension
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    /// How results are reported
    #[arg(long, value_enum, default_value_t = FeedbackStyle::Inline)]
    pub(crate) feedback: FeedbackStyle,
    /// Route reported on success in alert mode
    #[arg(long, default_value = "/success")]
    pub(crate) success_route: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FeedbackStyle {
    /// Show progress and results as inline messages
    Inline,
    /// Raise failures as alerts and navigate on success
    Alert,
}

impl FeedbackStyle {
    fn mode(self, success_route: &str) -> FeedbackMode {
        match self {
            FeedbackStyle::Inline => FeedbackMode::Inline,
            FeedbackStyle::Alert => FeedbackMode::AlertAndNavigate {
                success_route: success_route.to_string(),
            },
        }
    }
}

pub(crate) fn selected_file(path: &Path) -> Result<SelectedFile, AppError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(SelectedFile {
        name,
        content_type,
        bytes,
    })
}

fn feedback_text(feedback: &Feedback) -> String {
    match feedback {
        Feedback::Inline(message) => message.clone(),
        Feedback::Alert(message) => format!("alert: {message}"),
        Feedback::Navigate(route) => format!("navigate: {route}"),
    }
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let file = args.file.as_deref().map(selected_file).transpose()?;
    let form = ApplicantForm {
        first_name: args.first_name,
        last_name: args.last_name,
        occupation: args.occupation,
        residence: args.residence,
        file,
    };

    let client = HttpGatewayClient::new(&args.api_base)?;
    let submission = SubmissionForm::new(client, args.feedback.mode(&args.success_route));
    let report = submission.submit(&form).await;

    let final_line = feedback_text(&report.feedback);
    for line in report.progress.iter().filter(|line| **line != final_line) {
        println!("{line}");
    }

    if let SubmissionOutcome::RegistrationFailed { orphaned_file_url } = &report.outcome {
        warn!(%orphaned_file_url, "upload stored without an applicant record");
    }

    if report.succeeded() {
        println!("{final_line}");
        Ok(())
    } else {
        Err(AppError::Submission(final_line))
    }
}
