//! Access control: which caller state each operation requires.
//!
//! Checks run before the operation touches storage for writes. An anonymous
//! caller always gets `AuthenticationRequired` (the client should log in and
//! retry); an authenticated caller lacking a capability gets
//! `PermissionDenied`.

use crate::{
    error::{AppError, AppResult},
    models::user::{Capability, UserClaims},
};

/// Operations gated by caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ViewOwnLoans,
    ViewAllLoans,
    RenewInstance,
    LendInstance,
    ReturnInstance,
    ManageAuthors,
    ManageCatalog,
}

/// Caller state an operation needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Capability(Capability),
}

impl Operation {
    pub fn requirement(&self) -> Requirement {
        match self {
            Operation::ViewOwnLoans => Requirement::Authenticated,
            Operation::ViewAllLoans
            | Operation::RenewInstance
            | Operation::LendInstance
            | Operation::ReturnInstance => Requirement::Capability(Capability::CanMarkReturned),
            Operation::ManageAuthors | Operation::ManageCatalog => {
                Requirement::Capability(Capability::CatalogStaff)
            }
        }
    }
}

/// Check `caller` against the requirement of `operation`, returning the
/// authenticated identity on success.
pub fn authorize(operation: Operation, caller: Option<&UserClaims>) -> AppResult<&UserClaims> {
    let claims = caller.ok_or(AppError::AuthenticationRequired)?;
    match operation.requirement() {
        Requirement::Authenticated => Ok(claims),
        Requirement::Capability(capability) if claims.has(capability) => Ok(claims),
        Requirement::Capability(capability) => {
            tracing::debug!(
                "User {} lacks {} for {:?}",
                claims.sub,
                capability,
                operation
            );
            Err(AppError::PermissionDenied(format!(
                "The {} capability is required",
                capability
            )))
        }
    }
}
