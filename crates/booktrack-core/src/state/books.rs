use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Book, BookFields, BookFilters};

/// The ordered list of books the book screen shows.
///
/// It is rebuilt wholesale on refresh and patched one row at a time after
/// a create, update, or delete succeeds. It never re-fetches to reconcile.
#[derive(Debug, Clone, Default)]
pub struct BookList {
    books: Vec<Book>,
}

impl BookList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn replace_all(&mut self, books: Vec<Book>) {
        self.books = books;
    }

    /// Put the server's copy of a saved book into the list: replace the row
    /// with the same id, or append if there is none.
    pub fn apply_saved(&mut self, book: Book) {
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book,
            None => self.books.push(book),
        }
    }

    /// Drop the row with `id`. Returns whether one was present.
    pub fn remove_local(&mut self, id: &str) -> bool {
        let before = self.books.len();
        self.books.retain(|b| b.id != id);
        self.books.len() != before
    }

    /// Fetch the full list and replace local contents. On failure the list
    /// is left as it was.
    pub async fn refresh(
        &mut self,
        client: &ApiClient,
        filters: Option<&BookFilters>,
    ) -> Result<(), ApiError> {
        let books = client.list_books(filters).await.map_err(|e| {
            warn!(error = %e, "Failed to fetch books");
            e
        })?;
        self.replace_all(books);
        Ok(())
    }

    /// Create a book, or update `editing` when set, and apply the returned
    /// record to the list.
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        editing: Option<&str>,
        fields: &BookFields,
    ) -> Result<Book, ApiError> {
        let saved = match editing {
            Some(id) => client.update_book(id, fields).await?,
            None => client.create_book(fields).await?,
        };
        debug!(id = %saved.id, updated = editing.is_some(), "Book saved");
        self.apply_saved(saved.clone());
        Ok(saved)
    }

    /// Delete a book remotely, then locally. On failure the list is left as
    /// it was.
    pub async fn delete(&mut self, client: &ApiClient, id: &str) -> Result<(), ApiError> {
        client.delete_book(id).await?;
        self.remove_local(id);
        Ok(())
    }
}
