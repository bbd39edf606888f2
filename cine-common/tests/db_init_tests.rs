//! Integration tests for database initialization
//!
//! Covers schema creation on a fresh file, reopening an existing file, and
//! decoding rows into the shared models.

use cine_common::db::{init_database, Cinema, Movie, Screening};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("cine.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cine.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO movies (id, title) VALUES (1, 'Cléo de 5 à 7')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    // Reopening must keep existing rows
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cine.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "cinemas",
        "circuits",
        "directors",
        "languages",
        "movie_directors",
        "movie_languages",
        "movies",
        "screenings",
    ] {
        assert!(tables.iter().any(|t| t == expected), "Missing table: {}", expected);
    }
}

#[tokio::test]
async fn test_rows_decode_into_models() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cine.db")).await.unwrap();

    sqlx::query(
        "INSERT INTO movies (id, title, original_title, runtime, is_premiere) VALUES (7, 'Playtime', 'Playtime', 124, 1)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO cinemas (id, name, zipcode) VALUES (3, 'Le Champo', '75005')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO screenings (movie_id, cinema_id, date, starts_at) VALUES (7, 3, '2026-10-18', '20:30')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let movie: Movie = sqlx::query_as(
        "SELECT id, title, original_title, synopsis, poster_url, runtime, is_premiere, has_dvd_release, weekly_outing FROM movies",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(movie.runtime, 124);
    assert!(movie.is_premiere);
    assert!(movie.synopsis.is_none());
    assert!(movie.director_ids.is_empty());

    let cinema: Cinema = sqlx::query_as(
        "SELECT id, name, address, city, zipcode, circuit_id FROM cinemas",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(cinema.zipcode.as_deref(), Some("75005"));
    assert_eq!(cinema.circuit_id, None);

    let screening: Screening = sqlx::query_as(
        "SELECT id, movie_id, cinema_id, date, starts_at, diffusion_version FROM screenings",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(screening.date, "2026-10-18");
    assert_eq!(screening.starts_at.as_deref(), Some("20:30"));
}
