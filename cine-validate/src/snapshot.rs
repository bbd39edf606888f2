//! Snapshot loader
//!
//! Reads every collection once and assembles an immutable in-memory view for
//! a single validation pass. Link rows are folded into their movies; link rows
//! pointing at a missing movie are kept in the raw link collections so the
//! broken-link rules can see them.

use cine_common::db::{
    Cinema, Circuit, Director, Language, Movie, MovieDirector, MovieLanguage, Screening,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::LoadError;
use crate::store::DataStore;

/// Point-in-time view of all entity collections
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub movies: Vec<Movie>,
    pub directors: Vec<Director>,
    pub movie_directors: Vec<MovieDirector>,
    pub languages: Vec<Language>,
    pub movie_languages: Vec<MovieLanguage>,
    pub circuits: Vec<Circuit>,
    pub cinemas: Vec<Cinema>,
    pub screenings: Vec<Screening>,
}

/// Entity counts shown at the top of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityTotals {
    pub movies: usize,
    pub directors: usize,
    pub circuits: usize,
    pub cinemas: usize,
    pub cinemas_with_screenings: usize,
    pub screenings: usize,
}

impl Snapshot {
    /// Assemble a snapshot, folding link rows into the movies they reference
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        mut movies: Vec<Movie>,
        directors: Vec<Director>,
        movie_directors: Vec<MovieDirector>,
        languages: Vec<Language>,
        movie_languages: Vec<MovieLanguage>,
        circuits: Vec<Circuit>,
        cinemas: Vec<Cinema>,
        screenings: Vec<Screening>,
    ) -> Self {
        let mut director_ids: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for link in &movie_directors {
            director_ids
                .entry(link.movie_id)
                .or_default()
                .insert(link.director_id);
        }

        let mut language_codes: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
        for link in &movie_languages {
            language_codes
                .entry(link.movie_id)
                .or_default()
                .insert(link.code.clone());
        }

        for movie in &mut movies {
            movie.director_ids = director_ids.remove(&movie.id).unwrap_or_default();
            movie.language_codes = language_codes.remove(&movie.id).unwrap_or_default();
        }

        Self {
            movies,
            directors,
            movie_directors,
            languages,
            movie_languages,
            circuits,
            cinemas,
            screenings,
        }
    }

    pub fn movie_ids(&self) -> BTreeSet<i64> {
        self.movies.iter().map(|m| m.id).collect()
    }

    pub fn cinema_ids(&self) -> BTreeSet<i64> {
        self.cinemas.iter().map(|c| c.id).collect()
    }

    pub fn circuit_ids(&self) -> BTreeSet<i64> {
        self.circuits.iter().map(|c| c.id).collect()
    }

    pub fn totals(&self) -> EntityTotals {
        let cinema_ids = self.cinema_ids();
        let cinemas_with_screenings = self
            .screenings
            .iter()
            .map(|s| s.cinema_id)
            .filter(|id| cinema_ids.contains(id))
            .collect::<BTreeSet<_>>()
            .len();

        EntityTotals {
            movies: self.movies.len(),
            directors: self.directors.len(),
            circuits: self.circuits.len(),
            cinemas: self.cinemas.len(),
            cinemas_with_screenings,
            screenings: self.screenings.len(),
        }
    }
}

fn collection<T>(
    name: &'static str,
    result: cine_common::Result<Vec<T>>,
) -> Result<Vec<T>, LoadError> {
    let rows = result.map_err(|source| LoadError::Collection {
        collection: name,
        source,
    })?;
    debug!("Loaded {} {}", rows.len(), name);
    Ok(rows)
}

/// Load a complete snapshot; any failing collection fails the whole load
pub async fn load_snapshot(store: &dyn DataStore) -> Result<Snapshot, LoadError> {
    let movies = collection("movies", store.fetch_movies().await)?;
    let directors = collection("directors", store.fetch_directors().await)?;
    let movie_directors = collection("movie_directors", store.fetch_movie_directors().await)?;
    let languages = collection("languages", store.fetch_languages().await)?;
    let movie_languages = collection("movie_languages", store.fetch_movie_languages().await)?;
    let circuits = collection("circuits", store.fetch_circuits().await)?;
    let cinemas = collection("cinemas", store.fetch_cinemas().await)?;
    let screenings = collection("screenings", store.fetch_screenings().await)?;

    let snapshot = Snapshot::assemble(
        movies,
        directors,
        movie_directors,
        languages,
        movie_languages,
        circuits,
        cinemas,
        screenings,
    );

    let totals = snapshot.totals();
    info!(
        "Snapshot loaded: {} movies, {} cinemas, {} circuits, {} screenings",
        totals.movies, totals.cinemas, totals.circuits, totals.screenings
    );

    Ok(snapshot)
}
