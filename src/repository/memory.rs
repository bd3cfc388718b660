//! In-memory storage backend implementing every repository trait.
//!
//! Tables sit behind a single `RwLock`; each mutation takes the write lock
//! once, so concurrent writes to the same row resolve last-write-wins.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    authors::AuthorsRepository,
    book_instances::{BookInstancesRepository, InstanceFilter, InstanceOrder},
    books::BooksRepository,
    reference::ReferenceRepository,
    users::UsersRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorInput},
        book::{Book, BookInput},
        book_instance::BookInstance,
        reference::{Genre, Language},
        user::{Capability, User},
    },
};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    genres: BTreeMap<i32, Genre>,
    languages: BTreeMap<i32, Language>,
    instances: HashMap<Uuid, BookInstance>,
    users: BTreeMap<i32, User>,
    last_id: i32,
}

impl Tables {
    /// Surrogate ids are shared across tables; only uniqueness per table matters.
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_books(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    books
}

#[async_trait]
impl AuthorsRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        self.tables
            .read()
            .await
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Author", id))
    }

    async fn list(&self) -> AppResult<Vec<Author>> {
        let mut authors: Vec<Author> = self.tables.read().await.authors.values().cloned().collect();
        authors.sort_by(Author::cmp_display);
        Ok(authors)
    }

    async fn create(&self, author: &AuthorInput) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let created = Author {
            id: tables.next_id(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
        };
        tables.authors.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Author", id))?;
        existing.first_name = author.first_name.clone();
        existing.last_name = author.last_name.clone();
        existing.date_of_birth = author.date_of_birth;
        existing.date_of_death = author.date_of_death;
        Ok(existing.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.tables
            .write()
            .await
            .authors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Author", id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.tables
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(sorted_books(self.tables.read().await.books.values().cloned().collect()))
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(sorted_books(
            tables
                .books
                .values()
                .filter(|b| b.author_id == author_id)
                .cloned()
                .collect(),
        ))
    }

    async fn search_by_title(&self, substring: &str) -> AppResult<Vec<Book>> {
        let needle = substring.to_lowercase();
        let tables = self.tables.read().await;
        Ok(sorted_books(
            tables
                .books
                .values()
                .filter(|b| b.title.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        ))
    }

    async fn create(&self, book: &BookInput) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let created = Book {
            id: tables.next_id(),
            title: book.title.clone(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            author_id: book.author_id,
            language_id: book.language_id,
            genre_ids: book.genre_ids.clone(),
        };
        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, book: &BookInput) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Book", id))?;
        existing.title = book.title.clone();
        existing.summary = book.summary.clone();
        existing.isbn = book.isbn.clone();
        existing.author_id = book.author_id;
        existing.language_id = book.language_id;
        existing.genre_ids = book.genre_ids.clone();
        Ok(existing.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.tables
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }
}

#[async_trait]
impl ReferenceRepository for MemoryStore {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let mut genres: Vec<Genre> = self.tables.read().await.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn get_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables
            .genres
            .values()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn create_genre(&self, name: &str) -> AppResult<Genre> {
        let mut tables = self.tables.write().await;
        let genre = Genre {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn count_genres(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.genres.len() as i64)
    }

    async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let mut languages: Vec<Language> =
            self.tables.read().await.languages.values().cloned().collect();
        languages.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(languages)
    }

    async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.tables
            .read()
            .await
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Language", id))
    }

    async fn create_language(&self, name: &str) -> AppResult<Language> {
        let mut tables = self.tables.write().await;
        let language = Language {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.languages.insert(language.id, language.clone());
        Ok(language)
    }
}

#[async_trait]
impl BookInstancesRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        self.tables
            .read()
            .await
            .instances
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Book instance", id))
    }

    async fn find(&self, filter: &InstanceFilter) -> AppResult<Vec<BookInstance>> {
        let mut found: Vec<BookInstance> = self
            .tables
            .read()
            .await
            .instances
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();

        match filter.order {
            InstanceOrder::Id => found.sort_by_key(|i| i.id),
            InstanceOrder::DueBack => {
                found.sort_by_key(|i| (i.due_back.is_none(), i.due_back, i.id))
            }
        }
        Ok(found)
    }

    async fn count(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.instances.values().filter(|i| filter.matches(i)).count() as i64)
    }

    async fn insert(&self, instance: &BookInstance) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.instances.contains_key(&instance.id) {
            return Err(AppError::Conflict(format!(
                "Book instance {} already exists",
                instance.id
            )));
        }
        tables.instances.insert(instance.id, instance.clone());
        Ok(())
    }

    async fn save(&self, instance: &BookInstance) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.instances.get_mut(&instance.id) {
            Some(existing) => {
                *existing = instance.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Book instance", instance.id)),
        }
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("User", id))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!("Username {} is taken", username)));
        }
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            capabilities: capabilities.to_vec(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}
