//! User model, capabilities and JWT claims

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Named permission checked before sensitive operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Manage loans: list all loans, renew, lend, mark returned
    CanMarkReturned,
    /// Manage the catalog: authors, books, genres, languages, copies
    CatalogStaff,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanMarkReturned => "can_mark_returned",
            Capability::CatalogStaff => "catalog_staff",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "can_mark_returned" => Ok(Capability::CanMarkReturned),
            "catalog_staff" => Ok(Capability::CatalogStaff),
            _ => Err(format!("Invalid capability: {}", s)),
        }
    }
}

/// Internal row structure for database queries (capabilities as text[])
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: i32,
    username: String,
    password_hash: String,
    capabilities: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            capabilities: row
                .capabilities
                .iter()
                .filter_map(|c| match c.parse() {
                    Ok(cap) => Some(cap),
                    Err(e) => {
                        tracing::warn!("Ignoring stored capability for user {}: {}", row.id, e);
                        None
                    }
                })
                .collect(),
        }
    }
}

/// Library user (borrower or staff)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub capabilities: Vec<Capability>,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserClaims {
    /// Username
    pub sub: String,
    pub user_id: i32,
    pub capabilities: Vec<Capability>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, iat: i64, exp: i64) -> Self {
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            capabilities: user.capabilities.clone(),
            exp,
            iat,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
