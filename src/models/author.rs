//! Author model and related types

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::book::Book;
use crate::validation::validate_lifespan;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First", as shown in listings
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Listing order: last name, then most recent birth first (unknown last), then id.
    pub fn cmp_display(&self, other: &Self) -> Ordering {
        self.last_name
            .cmp(&other.last_name)
            .then_with(|| match (self.date_of_birth, other.date_of_birth) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Author with the books attributed to them
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<Book>,
}

/// Create or update author request (full form)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_author_dates"))]
pub struct AuthorInput {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

fn validate_author_dates(input: &AuthorInput) -> Result<(), ValidationError> {
    validate_lifespan(input.date_of_birth, input.date_of_death)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: i32, last: &str, born: Option<(i32, u32, u32)>) -> Author {
        Author {
            id,
            first_name: "Dominique".to_string(),
            last_name: last.to_string(),
            date_of_birth: born.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            date_of_death: None,
        }
    }

    #[test]
    fn display_order_is_surname_then_youngest_first() {
        let mut authors = vec![
            author(1, "Smith", Some((1950, 1, 1))),
            author(2, "Adams", None),
            author(3, "Smith", None),
            author(4, "Smith", Some((1970, 6, 1))),
            author(5, "Adams", Some((1900, 1, 1))),
        ];
        authors.sort_by(Author::cmp_display);
        let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 2, 4, 1, 3]);
    }

    #[test]
    fn display_name() {
        assert_eq!(author(1, "Smith", None).display_name(), "Smith, Dominique");
    }

    #[test]
    fn input_rejects_death_before_birth() {
        let input = AuthorInput {
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1950, 1, 1),
            date_of_death: NaiveDate::from_ymd_opt(1940, 1, 1),
        };
        assert!(input.validate().is_err());

        let input = AuthorInput {
            date_of_death: NaiveDate::from_ymd_opt(2001, 1, 1),
            ..input
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn input_requires_names() {
        let input = AuthorInput {
            first_name: String::new(),
            last_name: "Smith".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert!(input.validate().is_err());
    }
}
