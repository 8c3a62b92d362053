use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Row, params};

use crate::error::AppError;
use crate::model::{Book, ContactSubmission, NewBook, NewContactSubmission};

pub const FEATURED_BOOKS: usize = 3;

const CREATE_CONTACT_SUBMISSIONS: &str = "CREATE TABLE IF NOT EXISTS contact_submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    subject TEXT,
    message TEXT NOT NULL,
    submitted_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_BOOKS: &str = "CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    description TEXT,
    filename TEXT NOT NULL,
    original_filename TEXT NOT NULL,
    uploaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const BOOK_COLUMNS: &str =
    "id, title, author, description, filename, original_filename, uploaded_at";
const CONTACT_COLUMNS: &str = "id, name, email, subject, message, submitted_at";

/// Handle to the SQLite file. Every call opens its own connection.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, AppError> {
        Connection::open(&self.path).map_err(AppError::from)
    }

    /// Creates both tables if missing. Safe to run on every start.
    pub fn init(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                AppError::storage(format!("create database dir {}: {err}", parent.display()))
            })?;
        }

        let conn = self.connect()?;
        conn.execute(CREATE_CONTACT_SUBMISSIONS, [])?;
        conn.execute(CREATE_BOOKS, [])?;
        Ok(())
    }

    /// Fails unless the file already exists and holds the `books` table.
    /// Never creates the file or any table.
    pub fn ensure_existing(&self) -> Result<(), AppError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| AppError::storage(format!("open {}: {err}", self.path.display())))?;
        let has_books: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'books')",
            [],
            |row| row.get(0),
        )?;
        if !has_books {
            return Err(AppError::storage(format!(
                "{} has no books table",
                self.path.display()
            )));
        }
        Ok(())
    }

    pub fn insert_contact_submission(
        &self,
        new: &NewContactSubmission,
    ) -> Result<i64, AppError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO contact_submissions (name, email, subject, message, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.name, new.email, new.subject, new.message, new.submitted_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_contact_submissions(&self) -> Result<Vec<ContactSubmission>, AppError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_submissions
             ORDER BY submitted_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], contact_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_book(&self, new: &NewBook) -> Result<i64, AppError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO books
                 (title, author, description, filename, original_filename, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.title,
                new.author,
                new.description,
                new.filename,
                new.original_filename,
                new.uploaded_at
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest first. `None` returns every book.
    pub fn list_books(&self, limit: Option<usize>) -> Result<Vec<Book>, AppError> {
        let conn = self.connect()?;
        // SQLite treats a negative LIMIT as no limit.
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books
             ORDER BY uploaded_at DESC, id DESC
             LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(params![limit], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn featured_books(&self) -> Result<Vec<Book>, AppError> {
        self.list_books(Some(FEATURED_BOOKS))
    }

    pub fn book_filenames(&self) -> Result<Vec<String>, AppError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT filename FROM books")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>("filename"))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get("id")?,
        title: row.get("title")?,
        author: row.get("author")?,
        description: row.get("description")?,
        filename: row.get("filename")?,
        original_filename: row.get("original_filename")?,
        uploaded_at: row.get("uploaded_at")?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<ContactSubmission> {
    Ok(ContactSubmission {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        subject: row.get("subject")?,
        message: row.get("message")?,
        submitted_at: row.get("submitted_at")?,
    })
}
