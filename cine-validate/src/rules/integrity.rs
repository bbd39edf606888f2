//! Referential integrity and uniqueness rules
//!
//! Dangling references are reported one finding per violating record.
//! Uniqueness violations are reported one finding per duplicate set, keyed so
//! that a set of N identical records never yields more than one finding.

use cine_common::db::{Director, Movie, Screening};
use std::collections::{BTreeMap, BTreeSet};

use super::{EntityKind, EntityRef, Violation};
use crate::error::RuleError;
use crate::run::ValidationRun;
use crate::snapshot::Snapshot;

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn movie_ref(movie: &Movie) -> EntityRef {
    EntityRef::new(EntityKind::Movie, movie.id, movie.title.clone())
}

pub(crate) fn screening_ref(screening: &Screening) -> EntityRef {
    EntityRef::new(
        EntityKind::Screening,
        screening.id,
        format!(
            "movie {} at cinema {} on {} {}",
            screening.movie_id,
            screening.cinema_id,
            screening.date,
            screening.starts_at.as_deref().unwrap_or("--:--")
        ),
    )
}

fn director_ref(director: &Director) -> EntityRef {
    EntityRef::new(EntityKind::Director, director.id, director.full_name())
}

pub fn orphaned_movie_refs(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let movie_ids = snapshot.movie_ids();

    Ok(snapshot
        .screenings
        .iter()
        .filter(|s| !movie_ids.contains(&s.movie_id))
        .map(|s| {
            Violation::record(
                format!(
                    "Screening {} references missing movie {}",
                    s.id, s.movie_id
                ),
                screening_ref(s),
            )
        })
        .collect())
}

pub fn orphaned_cinema_refs(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let cinema_ids = snapshot.cinema_ids();

    Ok(snapshot
        .screenings
        .iter()
        .filter(|s| !cinema_ids.contains(&s.cinema_id))
        .map(|s| {
            Violation::record(
                format!(
                    "Screening {} references missing cinema {}",
                    s.id, s.cinema_id
                ),
                screening_ref(s),
            )
        })
        .collect())
}

pub fn invalid_circuit_refs(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let circuit_ids = snapshot.circuit_ids();

    Ok(snapshot
        .cinemas
        .iter()
        .filter_map(|cinema| {
            let circuit_id = cinema.circuit_id?;
            if circuit_ids.contains(&circuit_id) {
                return None;
            }
            Some(Violation::record(
                format!(
                    "Cinema '{}' references missing circuit {}",
                    cinema.name, circuit_id
                ),
                EntityRef::new(EntityKind::Cinema, cinema.id, cinema.name.clone()),
            ))
        })
        .collect())
}

/// Same normalized title and original title under different identifiers
///
/// A missing original title counts as equal to the title, matching how the
/// importer fills it.
pub fn duplicate_movies(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let mut groups: BTreeMap<(String, String), Vec<&Movie>> = BTreeMap::new();
    for movie in &snapshot.movies {
        let title = normalize(&movie.title);
        let original = movie
            .original_title
            .as_deref()
            .map(normalize)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title.clone());
        groups.entry((title, original)).or_default().push(movie);
    }

    Ok(groups
        .into_values()
        .filter(|movies| movies.len() > 1)
        .map(|movies| {
            let ids: Vec<String> = movies.iter().map(|m| m.id.to_string()).collect();
            Violation::group(
                format!(
                    "Movie '{}' ({}min) exists {} times with ids {}",
                    movies[0].title,
                    movies[0].runtime,
                    movies.len(),
                    ids.join(", ")
                ),
                movies.iter().map(|m| movie_ref(m)).collect(),
            )
        })
        .collect())
}

/// Screenings sharing (movie, cinema, date, start time)
pub fn duplicate_screenings(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let mut groups: BTreeMap<(i64, i64, &str, Option<&str>), Vec<&Screening>> = BTreeMap::new();
    for screening in &snapshot.screenings {
        let key = (
            screening.movie_id,
            screening.cinema_id,
            screening.date.as_str(),
            screening.starts_at.as_deref(),
        );
        groups.entry(key).or_default().push(screening);
    }

    Ok(groups
        .into_iter()
        .filter(|(_, screenings)| screenings.len() > 1)
        .map(|((movie_id, cinema_id, date, starts_at), screenings)| {
            Violation::group(
                format!(
                    "Screening of movie {} at cinema {} on {} at {} recorded {} times",
                    movie_id,
                    cinema_id,
                    date,
                    starts_at.unwrap_or("--:--"),
                    screenings.len()
                ),
                screenings.iter().map(|s| screening_ref(s)).collect(),
            )
        })
        .collect())
}

/// Directors sharing a normalized (first name, last name)
pub fn duplicate_directors(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let mut groups: BTreeMap<(String, String), Vec<&Director>> = BTreeMap::new();
    for director in &snapshot.directors {
        let key = (normalize(&director.first_name), normalize(&director.last_name));
        groups.entry(key).or_default().push(director);
    }

    Ok(groups
        .into_values()
        .filter(|directors| directors.len() > 1)
        .map(|directors| {
            Violation::group(
                format!(
                    "Director '{}' exists {} times",
                    directors[0].full_name(),
                    directors.len()
                ),
                directors.iter().map(|d| director_ref(d)).collect(),
            )
        })
        .collect())
}

pub fn broken_director_links(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let movie_ids = snapshot.movie_ids();
    let director_ids: BTreeSet<i64> = snapshot.directors.iter().map(|d| d.id).collect();

    let broken = snapshot
        .movie_directors
        .iter()
        .filter(|l| !movie_ids.contains(&l.movie_id) || !director_ids.contains(&l.director_id))
        .map(|l| {
            EntityRef::new(
                EntityKind::MovieDirectorLink,
                format!("{}:{}", l.movie_id, l.director_id),
                format!("movie {} / director {}", l.movie_id, l.director_id),
            )
        })
        .collect();

    Ok(Violation::aggregate(broken, "movie-director links point to a missing movie or director"))
}

pub fn broken_language_links(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let movie_ids = snapshot.movie_ids();
    let codes: BTreeSet<&str> = snapshot.languages.iter().map(|l| l.code.as_str()).collect();

    let broken = snapshot
        .movie_languages
        .iter()
        .filter(|l| !movie_ids.contains(&l.movie_id) || !codes.contains(l.code.as_str()))
        .map(|l| {
            EntityRef::new(
                EntityKind::MovieLanguageLink,
                format!("{}:{}", l.movie_id, l.code),
                format!("movie {} / language {}", l.movie_id, l.code),
            )
        })
        .collect();

    Ok(Violation::aggregate(broken, "movie-language links point to a missing movie or language"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cine_common::db::{Cinema, Circuit, Language, MovieDirector, MovieLanguage};

    fn run() -> ValidationRun {
        ValidationRun::with_defaults(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn movie(id: i64, title: &str, original: Option<&str>) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            original_title: original.map(str::to_string),
            runtime: 110,
            ..Default::default()
        }
    }

    fn cinema(id: i64, circuit_id: Option<i64>) -> Cinema {
        Cinema {
            id,
            name: format!("Cinema {}", id),
            circuit_id,
            ..Default::default()
        }
    }

    fn screening(id: i64, movie_id: i64, cinema_id: i64, starts_at: &str) -> Screening {
        Screening {
            id,
            movie_id,
            cinema_id,
            date: "2026-10-20".to_string(),
            starts_at: Some(starts_at.to_string()),
            diffusion_version: None,
        }
    }

    #[test]
    fn test_orphaned_movie_refs_one_per_record() {
        let snapshot = Snapshot {
            movies: vec![movie(1, "Jeanne Dielman", None)],
            cinemas: vec![cinema(1, None)],
            screenings: vec![
                screening(1, 1, 1, "14:00"),
                screening(2, 2, 1, "16:00"),
                screening(3, 3, 1, "18:00"),
            ],
            ..Default::default()
        };

        let violations = orphaned_movie_refs(&snapshot, &run()).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].entities[0].id, "2");
        assert_eq!(violations[1].entities[0].id, "3");
    }

    #[test]
    fn test_orphaned_cinema_refs() {
        let snapshot = Snapshot {
            movies: vec![movie(1, "Jeanne Dielman", None)],
            cinemas: vec![cinema(1, None)],
            screenings: vec![screening(1, 1, 1, "14:00"), screening(2, 1, 8, "14:00")],
            ..Default::default()
        };

        let violations = orphaned_cinema_refs(&snapshot, &run()).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("missing cinema 8"));
    }

    #[test]
    fn test_invalid_circuit_refs_ignores_cinemas_without_circuit() {
        let snapshot = Snapshot {
            circuits: vec![Circuit {
                id: 10,
                code: "circuit-mk2".to_string(),
                name: "MK2".to_string(),
            }],
            cinemas: vec![cinema(1, Some(10)), cinema(2, None), cinema(3, Some(11))],
            ..Default::default()
        };

        let violations = invalid_circuit_refs(&snapshot, &run()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].entities[0].id, "3");
    }

    #[test]
    fn test_duplicate_movies_grouped_once() {
        let snapshot = Snapshot {
            movies: vec![
                movie(1, "Les Glaneurs et la Glaneuse", None),
                movie(2, "les glaneurs et la glaneuse ", Some("Les Glaneurs et la Glaneuse")),
                movie(3, "Sans toit ni loi", None),
            ],
            ..Default::default()
        };

        let violations = duplicate_movies(&snapshot, &run()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].entities.len(), 2);
        assert!(violations[0].message.contains("exists 2 times"));
    }

    #[test]
    fn test_same_title_different_original_is_not_duplicate() {
        let snapshot = Snapshot {
            movies: vec![
                movie(1, "Solaris", Some("Солярис")),
                movie(2, "Solaris", Some("Solaris")),
            ],
            ..Default::default()
        };

        assert!(duplicate_movies(&snapshot, &run()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_screening_pair_yields_one_finding() {
        let snapshot = Snapshot {
            screenings: vec![
                screening(1, 1, 1, "20:30"),
                screening(2, 1, 1, "20:30"),
                screening(3, 1, 1, "20:30"),
                screening(4, 1, 1, "22:00"),
            ],
            ..Default::default()
        };

        let violations = duplicate_screenings(&snapshot, &run()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].entities.len(), 3);
    }

    #[test]
    fn test_duplicate_directors_normalized() {
        let snapshot = Snapshot {
            directors: vec![
                Director { id: 1, first_name: "Chantal".into(), last_name: "Akerman".into() },
                Director { id: 2, first_name: "chantal ".into(), last_name: "AKERMAN".into() },
                Director { id: 3, first_name: "Claire".into(), last_name: "Denis".into() },
            ],
            ..Default::default()
        };

        let violations = duplicate_directors(&snapshot, &run()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].entities.len(), 2);
    }

    #[test]
    fn test_broken_links_aggregate() {
        let snapshot = Snapshot::assemble(
            vec![movie(1, "Beau Travail", None)],
            vec![Director { id: 5, first_name: "Claire".into(), last_name: "Denis".into() }],
            vec![
                MovieDirector { movie_id: 1, director_id: 5 },
                MovieDirector { movie_id: 1, director_id: 6 },
                MovieDirector { movie_id: 2, director_id: 5 },
            ],
            vec![Language { code: "fr".into(), label: Some("Français".into()) }],
            vec![
                MovieLanguage { movie_id: 1, code: "fr".into() },
                MovieLanguage { movie_id: 1, code: "xx".into() },
            ],
            vec![],
            vec![],
            vec![],
        );

        let directors = broken_director_links(&snapshot, &run()).unwrap();
        assert_eq!(directors.len(), 1);
        assert_eq!(directors[0].count, Some(2));

        let languages = broken_language_links(&snapshot, &run()).unwrap();
        assert_eq!(languages.len(), 1);
        assert_eq!(languages[0].count, Some(1));
    }
}
