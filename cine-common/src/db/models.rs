//! Database models
//!
//! One struct per table, decoded with `sqlx::FromRow`. Optional text columns
//! stay `Option<String>`; callers decide whether an empty string counts as
//! missing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    /// Minutes, 0 when unknown
    pub runtime: i64,
    pub is_premiere: bool,
    pub has_dvd_release: bool,
    pub weekly_outing: bool,
    /// Filled from `movie_directors` by the snapshot loader
    #[sqlx(skip)]
    pub director_ids: BTreeSet<i64>,
    /// Filled from `movie_languages` by the snapshot loader
    #[sqlx(skip)]
    pub language_codes: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Director {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Director {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieDirector {
    pub movie_id: i64,
    pub director_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Language {
    pub code: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieLanguage {
    pub movie_id: i64,
    pub code: String,
}

/// A cinema chain or operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Circuit {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cinema {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub circuit_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Screening {
    pub id: i64,
    pub movie_id: i64,
    pub cinema_id: i64,
    /// ISO date text (YYYY-MM-DD) as written by the importer
    pub date: String,
    /// HH:MM, absent for some provider entries
    pub starts_at: Option<String>,
    /// Subtitled, dubbed, original version...
    pub diffusion_version: Option<String>,
}

/// True when an optional text column is NULL or blank
pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&None));
        assert!(is_blank(&Some(String::new())));
        assert!(is_blank(&Some("   ".to_string())));
        assert!(!is_blank(&Some("12 rue de la Paix".to_string())));
    }

    #[test]
    fn test_director_full_name() {
        let director = Director {
            id: 1,
            first_name: "Agnès".to_string(),
            last_name: "Varda".to_string(),
        };
        assert_eq!(director.full_name(), "Agnès Varda");
    }
}
