//! Database initialization
//!
//! Creates the showtime schema written by the importer and read by the
//! validator. Every statement is `IF NOT EXISTS`, so running it against an
//! existing database is a no-op.
//!
//! No foreign keys are declared: dangling references are reported by
//! cine-validate rather than rejected at insert time.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table used by the import and validation tools
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_movies_table(pool).await?;
    create_directors_table(pool).await?;
    create_languages_table(pool).await?;
    create_circuits_table(pool).await?;
    create_cinemas_table(pool).await?;
    create_screenings_table(pool).await?;

    // Linking tables
    create_movie_directors_table(pool).await?;
    create_movie_languages_table(pool).await?;

    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            original_title TEXT,
            synopsis TEXT,
            poster_url TEXT,
            runtime INTEGER NOT NULL DEFAULT 0,
            is_premiere INTEGER NOT NULL DEFAULT 0,
            has_dvd_release INTEGER NOT NULL DEFAULT 0,
            weekly_outing INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_directors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS directors (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_languages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS languages (
            code TEXT PRIMARY KEY,
            label TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_circuits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS circuits (
            id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_cinemas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cinemas (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT,
            city TEXT,
            zipcode TEXT,
            circuit_id INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_screenings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS screenings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            movie_id INTEGER NOT NULL,
            cinema_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            starts_at TEXT,
            diffusion_version TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_screenings_date ON screenings(date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_movie_directors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_directors (
            movie_id INTEGER NOT NULL,
            director_id INTEGER NOT NULL,
            PRIMARY KEY (movie_id, director_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_movie_languages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_languages (
            movie_id INTEGER NOT NULL,
            code TEXT NOT NULL,
            PRIMARY KEY (movie_id, code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
