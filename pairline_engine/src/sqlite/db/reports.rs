use sqlx::SqliteConnection;

use crate::{db_types::NewReport, traits::UserAccountError};

pub async fn insert(report: NewReport, conn: &mut SqliteConnection) -> Result<(), UserAccountError> {
    sqlx::query("INSERT INTO reports (reporter_id, reported_id, reason) VALUES ($1, $2, $3)")
        .bind(report.reporter_id)
        .bind(report.reported_id)
        .bind(report.reason)
        .execute(conn)
        .await?;
    Ok(())
}
