pub mod models;
pub mod reader;
pub mod writer;

pub use writer::{AnswerInput, ResultWriter};

/// Open (creating if needed) the SQLite database and apply migrations.
pub async fn connect(db_path: &str) -> crate::error::Result<sqlx::SqlitePool> {
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{db_path}?mode=rwc")).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
