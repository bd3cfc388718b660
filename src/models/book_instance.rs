//! Book instance (lendable copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Loan status of a copy, stored as a single-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (TEXT column holding the code)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// A single lendable copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Random identifier, never sequential
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    /// Null while the copy is not on loan
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl BookInstance {
    /// New copy of `book_id`, in maintenance until staff releases it
    pub fn new(book_id: i32, imprint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            imprint: imprint.into(),
            due_back: None,
            borrower_id: None,
            status: LoanStatus::default(),
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_back.map(|d| d < today).unwrap_or(false)
    }

    /// On loan implies borrower and due date; available implies no borrower.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            LoanStatus::OnLoan => self.borrower_id.is_some() && self.due_back.is_some(),
            LoanStatus::Available => self.borrower_id.is_none(),
            LoanStatus::Maintenance | LoanStatus::Reserved => true,
        }
    }

    /// "{id} ({book title})", as shown in loan listings
    pub fn display(&self, book_title: &str) -> String {
        format!("{} ({})", self.id, book_title)
    }
}

/// Copy on loan, as listed to borrowers and staff
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Loan {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub book_title: String,
    pub display: String,
    pub is_overdue: bool,
}

impl Loan {
    pub fn new(instance: BookInstance, book_title: String, today: NaiveDate) -> Self {
        Self {
            display: instance.display(&book_title),
            is_overdue: instance.is_overdue(today),
            instance,
            book_title,
        }
    }
}

/// Create book instance request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: String,
    /// Initial status (defaults to maintenance; on-loan copies are created through lending)
    pub status: Option<LoanStatus>,
}

/// Renew loan request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenewRequest {
    /// New due-back date (YYYY-MM-DD)
    pub renewal_date: NaiveDate,
}

/// Lend copy request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LendRequest {
    pub borrower_id: i32,
    pub due_back: NaiveDate,
}
