//! Catalog service: authors, books, reference data and copies

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::{authorize, Operation},
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorInput},
        book::{display_genre, Book, BookDetails, BookInput},
        book_instance::{BookInstance, CreateBookInstance, LoanStatus},
        reference::{CreateNamed, Genre, Language},
        user::UserClaims,
    },
    repository::{InstanceFilter, Repository},
};

/// Headline counts shown on the catalog home page
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Titles containing the requested phrase, when one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_matching_titles: Option<i64>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn summary(&self, title_phrase: Option<&str>) -> AppResult<CatalogCounts> {
        let num_matching_titles = match title_phrase.filter(|s| !s.is_empty()) {
            Some(phrase) => Some(self.search_books_by_title(phrase).await?.len() as i64),
            None => None,
        };

        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.instances.count(&InstanceFilter::default()).await?,
            num_instances_available: self
                .repository
                .instances
                .count(&InstanceFilter::with_status(LoanStatus::Available))
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.reference.count_genres().await?,
            num_matching_titles,
        })
    }

    // ---- Authors ----

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let mut authors = self.repository.authors.list().await?;
        authors.sort_by(|a, b| a.cmp_display(b));
        Ok(authors)
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails { author, books })
    }

    pub async fn create_author(
        &self,
        input: AuthorInput,
        caller: Option<&UserClaims>,
    ) -> AppResult<Author> {
        let claims = authorize(Operation::ManageAuthors, caller)?;
        input.validate()?;

        let author = self.repository.authors.create(&input).await?;
        tracing::info!("User {} created author {} ({})", claims.sub, author.id, author.display_name());
        Ok(author)
    }

    pub async fn update_author(
        &self,
        id: i32,
        input: AuthorInput,
        caller: Option<&UserClaims>,
    ) -> AppResult<Author> {
        let claims = authorize(Operation::ManageAuthors, caller)?;
        input.validate()?;

        let author = self.repository.authors.update(id, &input).await?;
        tracing::info!("User {} updated author {}", claims.sub, id);
        Ok(author)
    }

    /// Delete an author; refused while books are attributed to them
    pub async fn delete_author(&self, id: i32, caller: Option<&UserClaims>) -> AppResult<()> {
        let claims = authorize(Operation::ManageAuthors, caller)?;
        self.repository.authors.get_by_id(id).await?;

        let books = self.repository.books.list_by_author(id).await?;
        if !books.is_empty() {
            return Err(AppError::Conflict(format!(
                "Author {} still has {} book(s)",
                id,
                books.len()
            )));
        }

        self.repository.authors.delete(id).await?;
        tracing::info!("User {} deleted author {}", claims.sub, id);
        Ok(())
    }

    // ---- Books ----

    /// All books, or those whose title contains `title` when given
    pub async fn list_books(&self, title: Option<&str>) -> AppResult<Vec<Book>> {
        match title.filter(|s| !s.is_empty()) {
            Some(substring) => self.search_books_by_title(substring).await,
            None => self.repository.books.list().await,
        }
    }

    /// Case-insensitive title containment, ordered by title then id
    pub async fn search_books_by_title(&self, substring: &str) -> AppResult<Vec<Book>> {
        tracing::debug!("Searching titles containing {:?}", substring);
        self.repository.books.search_by_title(substring).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = self.repository.authors.get_by_id(book.author_id).await?;
        let language = self.repository.reference.get_language(book.language_id).await?;
        let genres = self.repository.reference.get_genres(&book.genre_ids).await?;
        let instances = self
            .repository
            .instances
            .find(&InstanceFilter::for_book(id))
            .await?;

        Ok(BookDetails {
            display_genre: display_genre(&genres),
            book,
            author,
            language,
            genres,
            instances,
        })
    }

    pub async fn create_book(
        &self,
        mut input: BookInput,
        caller: Option<&UserClaims>,
    ) -> AppResult<Book> {
        let claims = authorize(Operation::ManageCatalog, caller)?;
        input.validate()?;
        self.check_book_references(&mut input).await?;

        let book = self.repository.books.create(&input).await?;
        tracing::info!("User {} created book {} ({})", claims.sub, book.id, book.title);
        Ok(book)
    }

    pub async fn update_book(
        &self,
        id: i32,
        mut input: BookInput,
        caller: Option<&UserClaims>,
    ) -> AppResult<Book> {
        let claims = authorize(Operation::ManageCatalog, caller)?;
        input.validate()?;
        self.repository.books.get_by_id(id).await?;
        self.check_book_references(&mut input).await?;

        let book = self.repository.books.update(id, &input).await?;
        tracing::info!("User {} updated book {}", claims.sub, id);
        Ok(book)
    }

    /// Delete a book; refused while copies of it exist
    pub async fn delete_book(&self, id: i32, caller: Option<&UserClaims>) -> AppResult<()> {
        let claims = authorize(Operation::ManageCatalog, caller)?;
        self.repository.books.get_by_id(id).await?;

        let copies = self
            .repository
            .instances
            .count(&InstanceFilter::for_book(id))
            .await?;
        if copies > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} still has {} copies",
                id, copies
            )));
        }

        self.repository.books.delete(id).await?;
        tracing::info!("User {} deleted book {}", claims.sub, id);
        Ok(())
    }

    /// Author, language and genres must exist; genre ids are sorted and deduplicated.
    async fn check_book_references(&self, input: &mut BookInput) -> AppResult<()> {
        self.repository.authors.get_by_id(input.author_id).await?;
        self.repository.reference.get_language(input.language_id).await?;

        input.genre_ids.sort_unstable();
        input.genre_ids.dedup();

        let found = self.repository.reference.get_genres(&input.genre_ids).await?;
        if let Some(missing) = input
            .genre_ids
            .iter()
            .find(|id| !found.iter().any(|g| g.id == **id))
        {
            return Err(AppError::not_found("Genre", missing));
        }
        Ok(())
    }

    // ---- Reference data ----

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.reference.list_genres().await
    }

    pub async fn create_genre(
        &self,
        input: CreateNamed,
        caller: Option<&UserClaims>,
    ) -> AppResult<Genre> {
        let claims = authorize(Operation::ManageCatalog, caller)?;
        input.validate()?;

        let genre = self.repository.reference.create_genre(input.name.trim()).await?;
        tracing::info!("User {} created genre {}", claims.sub, genre.name);
        Ok(genre)
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.reference.list_languages().await
    }

    pub async fn create_language(
        &self,
        input: CreateNamed,
        caller: Option<&UserClaims>,
    ) -> AppResult<Language> {
        let claims = authorize(Operation::ManageCatalog, caller)?;
        input.validate()?;

        let language = self
            .repository
            .reference
            .create_language(input.name.trim())
            .await?;
        tracing::info!("User {} created language {}", claims.sub, language.name);
        Ok(language)
    }

    // ---- Copies ----

    /// Register a new copy of a book. Copies start outside loan; lending is a separate step.
    pub async fn create_instance(
        &self,
        book_id: i32,
        input: CreateBookInstance,
        caller: Option<&UserClaims>,
    ) -> AppResult<BookInstance> {
        let claims = authorize(Operation::ManageCatalog, caller)?;
        input.validate()?;
        self.repository.books.get_by_id(book_id).await?;

        let mut instance = BookInstance::new(book_id, input.imprint.trim());
        match input.status {
            Some(LoanStatus::OnLoan) => {
                return Err(AppError::Validation(
                    "New copies cannot start on loan; lend them instead".to_string(),
                ))
            }
            Some(status) => instance.status = status,
            None => {}
        }

        self.repository.instances.insert(&instance).await?;
        tracing::info!(
            "User {} added copy {} of book {}",
            claims.sub,
            instance.id,
            book_id
        );
        Ok(instance)
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.get_by_id(id).await
    }
}
