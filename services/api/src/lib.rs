mod cli;
mod infra;
mod routes;
mod server;
mod submit;

use applicant_intake::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
