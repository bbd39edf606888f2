//! Missing-attribute and unused-entity rules
//!
//! All rules here aggregate: one finding carrying the number of affected
//! records, with every affected record attached for examples.

use cine_common::db::{is_blank, Cinema, Movie};
use std::collections::BTreeSet;

use super::integrity::movie_ref;
use super::{EntityKind, EntityRef, Violation};
use crate::error::RuleError;
use crate::run::ValidationRun;
use crate::snapshot::Snapshot;

fn cinema_ref(cinema: &Cinema) -> EntityRef {
    EntityRef::new(EntityKind::Cinema, cinema.id, cinema.name.clone())
}

fn cinemas_where(
    snapshot: &Snapshot,
    description: &str,
    predicate: impl Fn(&Cinema) -> bool,
) -> Vec<Violation> {
    let affected = snapshot
        .cinemas
        .iter()
        .filter(|&c| predicate(c))
        .map(cinema_ref)
        .collect();
    Violation::aggregate(affected, description)
}

fn movies_where(
    snapshot: &Snapshot,
    description: &str,
    predicate: impl Fn(&Movie) -> bool,
) -> Vec<Violation> {
    let affected = snapshot
        .movies
        .iter()
        .filter(|&m| predicate(m))
        .map(movie_ref)
        .collect();
    Violation::aggregate(affected, description)
}

pub fn cinemas_without_address(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    Ok(cinemas_where(snapshot, "cinemas without address", |c| {
        is_blank(&c.address)
    }))
}

pub fn cinemas_without_zipcode(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    Ok(cinemas_where(snapshot, "cinemas without postal code", |c| {
        is_blank(&c.zipcode)
    }))
}

pub fn unused_cinemas(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let programmed: BTreeSet<i64> = snapshot.screenings.iter().map(|s| s.cinema_id).collect();

    Ok(cinemas_where(snapshot, "cinemas have no screening", |c| {
        !programmed.contains(&c.id)
    }))
}

pub fn empty_circuits(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let used: BTreeSet<i64> = snapshot.cinemas.iter().filter_map(|c| c.circuit_id).collect();

    let empty = snapshot
        .circuits
        .iter()
        .filter(|c| !used.contains(&c.id))
        .map(|c| EntityRef::new(EntityKind::Circuit, c.id, c.name.clone()))
        .collect();

    Ok(Violation::aggregate(empty, "circuits without cinemas"))
}

pub fn movies_without_directors(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    Ok(movies_where(snapshot, "movies without directors", |m| {
        m.director_ids.is_empty()
    }))
}

pub fn movies_without_languages(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    Ok(movies_where(snapshot, "movies without language information", |m| {
        m.language_codes.is_empty()
    }))
}

pub fn movies_without_synopsis(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    Ok(movies_where(snapshot, "movies without synopsis", |m| {
        is_blank(&m.synopsis)
    }))
}

pub fn movies_without_poster(
    snapshot: &Snapshot,
    _run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    Ok(movies_where(snapshot, "movies without poster", |m| {
        is_blank(&m.poster_url)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cine_common::db::{Circuit, MovieDirector, Screening};

    fn run() -> ValidationRun {
        ValidationRun::with_defaults(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn snapshot() -> Snapshot {
        Snapshot::assemble(
            vec![
                Movie {
                    id: 1,
                    title: "Rex Studios".to_string(),
                    synopsis: Some("   ".to_string()),
                    poster_url: Some("https://img.example/rex.jpg".to_string()),
                    ..Default::default()
                },
                Movie {
                    id: 2,
                    title: "Cléo de 5 à 7".to_string(),
                    synopsis: Some("Paris, 21 juin 1961.".to_string()),
                    ..Default::default()
                },
            ],
            vec![],
            vec![MovieDirector { movie_id: 2, director_id: 1 }],
            vec![],
            vec![],
            vec![
                Circuit { id: 1, code: "circuit-ugc".into(), name: "UGC".into() },
                Circuit { id: 2, code: "circuit-pathe".into(), name: "Pathé".into() },
            ],
            vec![
                Cinema {
                    id: 1,
                    name: "UGC Les Halles".to_string(),
                    address: Some("7 place de la Rotonde".to_string()),
                    zipcode: Some("75001".to_string()),
                    circuit_id: Some(1),
                    ..Default::default()
                },
                Cinema {
                    id: 2,
                    name: "Studio 28".to_string(),
                    address: Some(String::new()),
                    zipcode: None,
                    ..Default::default()
                },
            ],
            vec![Screening {
                id: 1,
                movie_id: 1,
                cinema_id: 1,
                date: "2026-10-18".to_string(),
                ..Default::default()
            }],
        )
    }

    #[test]
    fn test_blank_address_counts_as_missing() {
        let violations = cinemas_without_address(&snapshot(), &run()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].count, Some(1));
        assert_eq!(violations[0].entities[0].label, "Studio 28");

        let violations = cinemas_without_zipcode(&snapshot(), &run()).unwrap();
        assert_eq!(violations[0].count, Some(1));
    }

    #[test]
    fn test_unused_cinemas_and_empty_circuits() {
        let unused = unused_cinemas(&snapshot(), &run()).unwrap();
        assert_eq!(unused[0].count, Some(1));
        assert_eq!(unused[0].entities[0].id, "2");

        let empty = empty_circuits(&snapshot(), &run()).unwrap();
        assert_eq!(empty[0].count, Some(1));
        assert_eq!(empty[0].entities[0].label, "Pathé");
    }

    #[test]
    fn test_movie_attribute_rules() {
        let snap = snapshot();

        let no_directors = movies_without_directors(&snap, &run()).unwrap();
        assert_eq!(no_directors[0].message, "1 movies without directors");
        assert_eq!(no_directors[0].entities[0].label, "Rex Studios");

        let no_languages = movies_without_languages(&snap, &run()).unwrap();
        assert_eq!(no_languages[0].count, Some(2));

        let no_synopsis = movies_without_synopsis(&snap, &run()).unwrap();
        assert_eq!(no_synopsis[0].entities[0].id, "1");

        let no_poster = movies_without_poster(&snap, &run()).unwrap();
        assert_eq!(no_poster[0].entities[0].id, "2");
    }

    #[test]
    fn test_complete_data_yields_nothing() {
        let snap = Snapshot::default();
        assert!(cinemas_without_address(&snap, &run()).unwrap().is_empty());
        assert!(unused_cinemas(&snap, &run()).unwrap().is_empty());
        assert!(movies_without_poster(&snap, &run()).unwrap().is_empty());
    }
}
