//! Data-access interface consumed by the validator
//!
//! Every fetch returns the complete collection or fails; there is no paging
//! and no partial result. The delete operations back the clean action.

use async_trait::async_trait;
use cine_common::db::{
    Cinema, Circuit, Director, Language, Movie, MovieDirector, MovieLanguage, Screening,
};
use cine_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use crate::db::{connect, AccessMode};
use crate::error::LoadError;

/// Identifiers bound per DELETE statement, below SQLite's parameter limit
const DELETE_BATCH_SIZE: usize = 500;

/// Read and clean operations over the showtime store
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn fetch_movies(&self) -> Result<Vec<Movie>>;
    async fn fetch_directors(&self) -> Result<Vec<Director>>;
    async fn fetch_movie_directors(&self) -> Result<Vec<MovieDirector>>;
    async fn fetch_languages(&self) -> Result<Vec<Language>>;
    async fn fetch_movie_languages(&self) -> Result<Vec<MovieLanguage>>;
    async fn fetch_circuits(&self) -> Result<Vec<Circuit>>;
    async fn fetch_cinemas(&self) -> Result<Vec<Cinema>>;
    async fn fetch_screenings(&self) -> Result<Vec<Screening>>;

    /// Delete the screenings with the given identifiers, all or none
    async fn delete_screenings(&self, ids: &[i64]) -> Result<u64>;

    /// Delete `movie_directors` rows whose movie or director does not exist
    async fn delete_broken_director_links(&self) -> Result<u64>;

    /// Delete `movie_languages` rows whose movie or language does not exist
    async fn delete_broken_language_links(&self) -> Result<u64>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open an existing database file
    pub async fn open(db_path: &Path, mode: AccessMode) -> std::result::Result<Self, LoadError> {
        Ok(Self::new(connect(db_path, mode).await?))
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn fetch_movies(&self) -> Result<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, original_title, synopsis, poster_url, runtime,
                   is_premiere, has_dvd_release, weekly_outing
            FROM movies
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn fetch_directors(&self) -> Result<Vec<Director>> {
        let directors = sqlx::query_as::<_, Director>(
            "SELECT id, first_name, last_name FROM directors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(directors)
    }

    async fn fetch_movie_directors(&self) -> Result<Vec<MovieDirector>> {
        let links = sqlx::query_as::<_, MovieDirector>(
            "SELECT movie_id, director_id FROM movie_directors ORDER BY movie_id, director_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn fetch_languages(&self) -> Result<Vec<Language>> {
        let languages =
            sqlx::query_as::<_, Language>("SELECT code, label FROM languages ORDER BY code")
                .fetch_all(&self.pool)
                .await?;
        Ok(languages)
    }

    async fn fetch_movie_languages(&self) -> Result<Vec<MovieLanguage>> {
        let links = sqlx::query_as::<_, MovieLanguage>(
            "SELECT movie_id, code FROM movie_languages ORDER BY movie_id, code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn fetch_circuits(&self) -> Result<Vec<Circuit>> {
        let circuits =
            sqlx::query_as::<_, Circuit>("SELECT id, code, name FROM circuits ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(circuits)
    }

    async fn fetch_cinemas(&self) -> Result<Vec<Cinema>> {
        let cinemas = sqlx::query_as::<_, Cinema>(
            "SELECT id, name, address, city, zipcode, circuit_id FROM cinemas ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(cinemas)
    }

    async fn fetch_screenings(&self) -> Result<Vec<Screening>> {
        let screenings = sqlx::query_as::<_, Screening>(
            r#"
            SELECT id, movie_id, cinema_id, date, starts_at, diffusion_version
            FROM screenings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(screenings)
    }

    async fn delete_screenings(&self, ids: &[i64]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for chunk in ids.chunks(DELETE_BATCH_SIZE) {
            let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM screenings WHERE id IN (");
            {
                let mut separated = query.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
                separated.push_unseparated(")");
            }

            deleted += query.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }

    async fn delete_broken_director_links(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM movie_directors
            WHERE movie_id NOT IN (SELECT id FROM movies)
               OR director_id NOT IN (SELECT id FROM directors)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_broken_language_links(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM movie_languages
            WHERE movie_id NOT IN (SELECT id FROM movies)
               OR code NOT IN (SELECT code FROM languages)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
