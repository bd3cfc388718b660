//! Loan workflows over the in-memory backend

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use catalog_server::{
    config::AuthConfig,
    models::{
        author::AuthorInput,
        book::BookInput,
        book_instance::{BookInstance, LendRequest, LoanStatus},
        reference::CreateNamed,
        user::{Capability, User, UserClaims},
    },
    repository::{BookInstancesRepository, MemoryStore, Repository},
    services::{sessions::MemorySessionStore, Services},
    AppError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn claims(user: &User) -> UserClaims {
    UserClaims::for_user(user, 0, i64::MAX)
}

struct Library {
    services: Services,
    repository: Repository,
    book_id: i32,
    borrower1: User,
    borrower2: User,
    librarian: User,
}

async fn library() -> Library {
    let repository = Repository::in_memory(MemoryStore::new());
    let services = Services::new(
        repository.clone(),
        AuthConfig::default(),
        Arc::new(MemorySessionStore::new(3600)),
    );

    let borrower1 = services
        .auth
        .create_user("testuser1", "1X<ISRUkw+tuK", &[])
        .await
        .unwrap();
    let borrower2 = services
        .auth
        .create_user("testuser2", "2HJ1vRV0Z&3iD", &[])
        .await
        .unwrap();
    let librarian = services
        .auth
        .create_user(
            "librarian",
            "2HJ1vRV0Z&3iD",
            &[Capability::CanMarkReturned, Capability::CatalogStaff],
        )
        .await
        .unwrap();
    let staff = claims(&librarian);

    let author = services
        .catalog
        .create_author(
            AuthorInput {
                first_name: "John".to_string(),
                last_name: "Smith".to_string(),
                date_of_birth: None,
                date_of_death: None,
            },
            Some(&staff),
        )
        .await
        .unwrap();
    let genre = services
        .catalog
        .create_genre(CreateNamed { name: "Fantasy".to_string() }, Some(&staff))
        .await
        .unwrap();
    let language = services
        .catalog
        .create_language(CreateNamed { name: "English".to_string() }, Some(&staff))
        .await
        .unwrap();
    let book = services
        .catalog
        .create_book(
            BookInput {
                title: "Book Title".to_string(),
                summary: "My book summary".to_string(),
                isbn: "ABCDEFG".to_string(),
                author_id: author.id,
                language_id: language.id,
                genre_ids: vec![genre.id],
            },
            Some(&staff),
        )
        .await
        .unwrap();

    Library {
        services,
        repository,
        book_id: book.id,
        borrower1,
        borrower2,
        librarian,
    }
}

impl Library {
    async fn copy(
        &self,
        status: LoanStatus,
        borrower: Option<&User>,
        due_back: Option<NaiveDate>,
    ) -> BookInstance {
        let mut copy = BookInstance::new(self.book_id, "Unlikely Imprint, 2016");
        copy.status = status;
        copy.borrower_id = borrower.map(|u| u.id);
        copy.due_back = due_back;
        self.repository.instances.insert(&copy).await.unwrap();
        copy
    }
}

#[tokio::test]
async fn renewal_within_four_weeks_moves_due_date() {
    let lib = library().await;
    let copy = lib
        .copy(LoanStatus::OnLoan, Some(&lib.borrower1), Some(date(2024, 1, 10)))
        .await;
    let staff = claims(&lib.librarian);

    let renewed = lib
        .services
        .loans
        .renew(copy.id, date(2024, 1, 12), Some(&staff), date(2024, 1, 5))
        .await
        .unwrap();
    assert_eq!(renewed.due_back, Some(date(2024, 1, 12)));

    let stored = lib.repository.instances.get_by_id(copy.id).await.unwrap();
    assert_eq!(stored.due_back, Some(date(2024, 1, 12)));
    assert_eq!(stored.status, LoanStatus::OnLoan);
    assert_eq!(stored.borrower_id, Some(lib.borrower1.id));
}

#[tokio::test]
async fn renewal_outside_window_is_rejected_and_nothing_changes() {
    let lib = library().await;
    let copy = lib
        .copy(LoanStatus::OnLoan, Some(&lib.borrower1), Some(date(2024, 1, 10)))
        .await;
    let staff = claims(&lib.librarian);
    let today = date(2024, 1, 5);

    for candidate in [date(2024, 1, 4), date(2024, 2, 10)] {
        let result = lib
            .services
            .loans
            .renew(copy.id, candidate, Some(&staff), today)
            .await;
        assert!(matches!(
            result,
            Err(AppError::InvalidDate { field: "renewal_date", .. })
        ));
    }

    // Both ends of the window are accepted
    for candidate in [today, today + Duration::days(28)] {
        assert!(lib
            .services
            .loans
            .renew(copy.id, candidate, Some(&staff), today)
            .await
            .is_ok());
    }

    let stored = lib.repository.instances.get_by_id(copy.id).await.unwrap();
    assert_eq!(stored.due_back, Some(today + Duration::days(28)));
}

#[tokio::test]
async fn renewal_proposes_three_weeks_ahead() {
    let lib = library().await;
    let copy = lib.copy(LoanStatus::OnLoan, Some(&lib.borrower1), Some(date(2024, 1, 10))).await;
    let staff = claims(&lib.librarian);

    let proposed = lib
        .services
        .loans
        .proposed_renewal(copy.id, Some(&staff), date(2024, 1, 5))
        .await
        .unwrap();
    assert_eq!(proposed, date(2024, 1, 26));
}

#[tokio::test]
async fn renewal_of_unknown_copy_is_not_found_for_every_caller() {
    let lib = library().await;
    let staff = claims(&lib.librarian);
    let reader = claims(&lib.borrower1);
    let unknown = Uuid::new_v4();

    for caller in [None, Some(&reader), Some(&staff)] {
        let result = lib
            .services
            .loans
            .renew(unknown, date(2024, 1, 12), caller, date(2024, 1, 5))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

#[tokio::test]
async fn renewal_requires_capability() {
    let lib = library().await;
    let copy = lib.copy(LoanStatus::OnLoan, Some(&lib.borrower1), Some(date(2024, 1, 10))).await;
    let reader = claims(&lib.borrower1);

    assert!(matches!(
        lib.services
            .loans
            .renew(copy.id, date(2024, 1, 12), None, date(2024, 1, 5))
            .await,
        Err(AppError::AuthenticationRequired)
    ));
    assert!(matches!(
        lib.services
            .loans
            .renew(copy.id, date(2024, 1, 12), Some(&reader), date(2024, 1, 5))
            .await,
        Err(AppError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn borrowers_only_see_their_own_loans_soonest_first() {
    let lib = library().await;
    let base = date(2024, 1, 5);

    for i in 0..30 {
        let borrower = if i % 2 == 0 { &lib.borrower1 } else { &lib.borrower2 };
        let status = if i % 3 == 0 { LoanStatus::Maintenance } else { LoanStatus::OnLoan };
        lib.copy(status, Some(borrower), Some(base + Duration::days(i % 5)))
            .await;
    }

    let reader = claims(&lib.borrower1);
    let loans = lib
        .services
        .loans
        .loans_for_user(Some(&reader), base)
        .await
        .unwrap();

    assert_eq!(loans.len(), 10);
    assert!(loans.iter().all(|l| l.instance.borrower_id == Some(lib.borrower1.id)));
    assert!(loans.iter().all(|l| l.instance.status == LoanStatus::OnLoan));
    assert!(loans
        .windows(2)
        .all(|w| w[0].instance.due_back <= w[1].instance.due_back));
    assert!(loans
        .iter()
        .all(|l| l.display == format!("{} (Book Title)", l.instance.id)));

    assert!(matches!(
        lib.services.loans.loans_for_user(None, base).await,
        Err(AppError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn staff_see_every_outstanding_loan() {
    let lib = library().await;
    lib.copy(LoanStatus::OnLoan, Some(&lib.borrower1), Some(date(2024, 1, 20))).await;
    lib.copy(LoanStatus::OnLoan, Some(&lib.borrower2), Some(date(2024, 1, 8))).await;
    lib.copy(LoanStatus::Available, None, None).await;

    let staff = claims(&lib.librarian);
    let loans = lib
        .services
        .loans
        .all_outstanding_loans(Some(&staff), date(2024, 1, 10))
        .await
        .unwrap();
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0].instance.due_back, Some(date(2024, 1, 8)));
    assert_eq!(loans[0].book_title, "Book Title");
    assert!(loans[0].is_overdue);
    assert!(!loans[1].is_overdue);

    let reader = claims(&lib.borrower1);
    assert!(matches!(
        lib.services.loans.all_outstanding_loans(Some(&reader), date(2024, 1, 10)).await,
        Err(AppError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn lend_and_return_round_trip() {
    let lib = library().await;
    let copy = lib.copy(LoanStatus::Available, None, None).await;
    let staff = claims(&lib.librarian);
    let today = date(2024, 1, 5);

    let lent = lib
        .services
        .loans
        .lend(
            copy.id,
            LendRequest { borrower_id: lib.borrower2.id, due_back: date(2024, 1, 26) },
            Some(&staff),
            today,
        )
        .await
        .unwrap();
    assert_eq!(lent.status, LoanStatus::OnLoan);
    assert!(lent.is_consistent());

    let again = lib
        .services
        .loans
        .lend(
            copy.id,
            LendRequest { borrower_id: lib.borrower1.id, due_back: date(2024, 1, 26) },
            Some(&staff),
            today,
        )
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let available = lib.services.loans.available_copies().await.unwrap();
    assert!(available.iter().all(|c| c.id != copy.id));

    let returned = lib
        .services
        .loans
        .mark_returned(copy.id, Some(&staff))
        .await
        .unwrap();
    assert_eq!(returned.status, LoanStatus::Available);
    assert_eq!(returned.borrower_id, None);
    assert_eq!(returned.due_back, None);

    assert!(matches!(
        lib.services.loans.mark_returned(copy.id, Some(&staff)).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn lending_to_unknown_borrower_is_not_found() {
    let lib = library().await;
    let copy = lib.copy(LoanStatus::Available, None, None).await;
    let staff = claims(&lib.librarian);

    let result = lib
        .services
        .loans
        .lend(
            copy.id,
            LendRequest { borrower_id: 9999, due_back: date(2024, 1, 26) },
            Some(&staff),
            date(2024, 1, 5),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
