//! Loan service: copy availability, loan listings, renewal and lending

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    access::{authorize, Operation},
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstance, LendRequest, Loan, LoanStatus},
        user::UserClaims,
    },
    repository::{InstanceFilter, Repository},
    validation::{default_renewal_date, validate_renewal_date},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies currently available for lending
    pub async fn available_copies(&self) -> AppResult<Vec<BookInstance>> {
        self.repository
            .instances
            .find(&InstanceFilter::with_status(LoanStatus::Available))
            .await
    }

    /// Copies on loan to the caller, soonest due first
    pub async fn loans_for_user(
        &self,
        caller: Option<&UserClaims>,
        today: NaiveDate,
    ) -> AppResult<Vec<Loan>> {
        let claims = authorize(Operation::ViewOwnLoans, caller)?;
        tracing::debug!("Listing loans of user {}", claims.user_id);

        let copies = self
            .repository
            .instances
            .find(
                &InstanceFilter::with_status(LoanStatus::OnLoan)
                    .borrower(claims.user_id)
                    .ordered_by_due_back(),
            )
            .await?;
        self.with_titles(copies, today).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_outstanding_loans(
        &self,
        caller: Option<&UserClaims>,
        today: NaiveDate,
    ) -> AppResult<Vec<Loan>> {
        authorize(Operation::ViewAllLoans, caller)?;

        let copies = self
            .repository
            .instances
            .find(&InstanceFilter::with_status(LoanStatus::OnLoan).ordered_by_due_back())
            .await?;
        self.with_titles(copies, today).await
    }

    async fn with_titles(
        &self,
        copies: Vec<BookInstance>,
        today: NaiveDate,
    ) -> AppResult<Vec<Loan>> {
        if copies.is_empty() {
            return Ok(Vec::new());
        }

        let titles: HashMap<i32, String> = self
            .repository
            .books
            .list()
            .await?
            .into_iter()
            .map(|b| (b.id, b.title))
            .collect();

        copies
            .into_iter()
            .map(|copy| {
                let title = titles
                    .get(&copy.book_id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Book", copy.book_id))?;
                Ok(Loan::new(copy, title, today))
            })
            .collect()
    }

    /// Date proposed on the renewal form for an existing copy
    pub async fn proposed_renewal(
        &self,
        id: Uuid,
        caller: Option<&UserClaims>,
        today: NaiveDate,
    ) -> AppResult<NaiveDate> {
        self.repository.instances.get_by_id(id).await?;
        authorize(Operation::RenewInstance, caller)?;
        Ok(default_renewal_date(today))
    }

    /// Move the due-back date of a copy. The status is left as it is.
    pub async fn renew(
        &self,
        id: Uuid,
        renewal_date: NaiveDate,
        caller: Option<&UserClaims>,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        let mut instance = self.repository.instances.get_by_id(id).await?;
        let claims = authorize(Operation::RenewInstance, caller)?;

        let due_back = validate_renewal_date(renewal_date, today).map_err(|reason| {
            AppError::InvalidDate {
                field: "renewal_date",
                reason,
            }
        })?;

        instance.due_back = Some(due_back);
        self.repository.instances.save(&instance).await?;

        tracing::info!(
            "User {} renewed copy {} until {}",
            claims.sub,
            instance.id,
            due_back
        );
        Ok(instance)
    }

    /// Lend a copy to a borrower until `due_back`
    pub async fn lend(
        &self,
        id: Uuid,
        request: LendRequest,
        caller: Option<&UserClaims>,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        let mut instance = self.repository.instances.get_by_id(id).await?;
        let claims = authorize(Operation::LendInstance, caller)?;

        if instance.status == LoanStatus::OnLoan {
            return Err(AppError::Conflict(format!("Copy {} is already on loan", id)));
        }

        let due_back = validate_renewal_date(request.due_back, today).map_err(|reason| {
            AppError::InvalidDate {
                field: "due_back",
                reason,
            }
        })?;
        let borrower = self.repository.users.get_by_id(request.borrower_id).await?;

        instance.borrower_id = Some(borrower.id);
        instance.due_back = Some(due_back);
        instance.status = LoanStatus::OnLoan;
        self.repository.instances.save(&instance).await?;

        tracing::info!(
            "User {} lent copy {} to {} until {}",
            claims.sub,
            instance.id,
            borrower.username,
            due_back
        );
        Ok(instance)
    }

    /// Check a copy back in and make it available again
    pub async fn mark_returned(
        &self,
        id: Uuid,
        caller: Option<&UserClaims>,
    ) -> AppResult<BookInstance> {
        let mut instance = self.repository.instances.get_by_id(id).await?;
        let claims = authorize(Operation::ReturnInstance, caller)?;

        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::Conflict(format!("Copy {} is not on loan", id)));
        }

        instance.borrower_id = None;
        instance.due_back = None;
        instance.status = LoanStatus::Available;
        self.repository.instances.save(&instance).await?;

        tracing::info!("User {} marked copy {} returned", claims.sub, instance.id);
        Ok(instance)
    }
}
