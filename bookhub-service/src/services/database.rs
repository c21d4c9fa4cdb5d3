//! PostgreSQL persistence for accounts and the catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::HashMap;

use super::error::ServiceError;
use super::store::{AccountStore, OwnershipRecord, OwnershipStore};
use crate::models::{
    Account, AccountResponse, Author, Book, BookCategoryRow, BookDetail, BookQuery, Category,
    NewAccount, Review, ReviewWithUser,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// How a failed write relates to the schema's constraints.
enum Violation {
    Unique,
    ForeignKey,
}

fn violation(err: &sqlx::Error) -> Option<Violation> {
    let db_err = err.as_database_error()?;
    if db_err.is_unique_violation() {
        Some(Violation::Unique)
    } else if db_err.is_foreign_key_violation() {
        Some(Violation::ForeignKey)
    } else {
        None
    }
}

#[derive(FromRow)]
struct ReviewUserRow {
    id: i64,
    content: String,
    rating: i32,
    book_id: i64,
    user_id: i64,
    created_utc: DateTime<Utc>,
    username: String,
    email: String,
    role: String,
    account_created_utc: DateTime<Utc>,
}

impl From<ReviewUserRow> for ReviewWithUser {
    fn from(row: ReviewUserRow) -> Self {
        ReviewWithUser {
            review: Review {
                id: row.id,
                content: row.content,
                rating: row.rating,
                book_id: row.book_id,
                user_id: row.user_id,
                created_utc: row.created_utc,
            },
            user: AccountResponse {
                id: row.user_id,
                username: row.username,
                email: row.email,
                role: row.role,
                created_utc: row.account_created_utc,
            },
        }
    }
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                ServiceError::Database(e)
            })?;
        Ok(())
    }

    // ==================== Authors ====================

    pub async fn list_authors(&self) -> Result<Vec<Author>, ServiceError> {
        Ok(
            sqlx::query_as::<_, Author>("SELECT id, name, bio FROM authors ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn find_author(&self, id: i64) -> Result<Option<Author>, ServiceError> {
        Ok(
            sqlx::query_as::<_, Author>("SELECT id, name, bio FROM authors WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn create_author(
        &self,
        name: &str,
        bio: Option<&str>,
    ) -> Result<Author, ServiceError> {
        Ok(sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, bio) VALUES ($1, $2) RETURNING id, name, bio",
        )
        .bind(name)
        .bind(bio)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn update_author(
        &self,
        id: i64,
        name: &str,
        bio: Option<&str>,
    ) -> Result<Author, ServiceError> {
        sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = $2, bio = $3 WHERE id = $1 RETURNING id, name, bio",
        )
        .bind(id)
        .bind(name)
        .bind(bio)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("Author"))
    }

    /// Authors that still have books cannot be deleted.
    pub async fn delete_author(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::ForeignKey) => {
                    ServiceError::Conflict("Author still has books".to_string())
                }
                _ => ServiceError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Author"));
        }
        Ok(())
    }

    // ==================== Categories ====================

    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn find_category(&self, id: i64) -> Result<Option<Category>, ServiceError> {
        Ok(
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ServiceError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::Unique) => ServiceError::Conflict("Category already exists".to_string()),
            _ => ServiceError::Database(e),
        })
    }

    pub async fn update_category(&self, id: i64, name: &str) -> Result<Category, ServiceError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::Unique) => ServiceError::Conflict("Category already exists".to_string()),
            _ => ServiceError::Database(e),
        })?
        .ok_or(ServiceError::NotFound("Category"))
    }

    /// Removes the category and unlinks it from every book.
    pub async fn delete_category(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Category"));
        }
        Ok(())
    }

    // ==================== Books ====================

    /// List books with author, categories and reviews attached.
    ///
    /// The sort column and direction come from closed enums, so the
    /// interpolated ORDER BY never carries client text.
    pub async fn list_books(&self, query: &BookQuery) -> Result<Vec<BookDetail>, ServiceError> {
        let sql = format!(
            r#"
            SELECT b.id, b.title, b.author_id
            FROM books b
            WHERE $1::TEXT IS NULL OR EXISTS (
                SELECT 1 FROM book_categories bc
                JOIN categories c ON c.id = bc.category_id
                WHERE bc.book_id = b.id AND c.name = $1
            )
            ORDER BY {} {}, b.id ASC
            "#,
            query.sort.column(),
            query.order.keyword()
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(query.category.as_deref())
            .fetch_all(&self.pool)
            .await?;

        self.attach_details(books).await
    }

    pub async fn find_book(&self, id: i64) -> Result<Option<BookDetail>, ServiceError> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, author_id FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match book {
            Some(book) => Ok(self.attach_details(vec![book]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Three batched lookups regardless of how many books are listed.
    async fn attach_details(&self, books: Vec<Book>) -> Result<Vec<BookDetail>, ServiceError> {
        if books.is_empty() {
            return Ok(Vec::new());
        }

        let book_ids: Vec<i64> = books.iter().map(|b| b.id).collect();
        let author_ids: Vec<i64> = books.iter().map(|b| b.author_id).collect();

        let authors: HashMap<i64, Author> = sqlx::query_as::<_, Author>(
            "SELECT id, name, bio FROM authors WHERE id = ANY($1)",
        )
        .bind(&author_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
        let rows = sqlx::query_as::<_, BookCategoryRow>(
            r#"
            SELECT bc.book_id, c.id, c.name
            FROM book_categories bc
            JOIN categories c ON c.id = bc.category_id
            WHERE bc.book_id = ANY($1)
            ORDER BY c.id
            "#,
        )
        .bind(&book_ids)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            categories.entry(row.book_id).or_default().push(Category {
                id: row.id,
                name: row.name,
            });
        }

        let mut reviews: HashMap<i64, Vec<Review>> = HashMap::new();
        let rows = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, content, rating, book_id, user_id, created_utc
            FROM reviews
            WHERE book_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&book_ids)
        .fetch_all(&self.pool)
        .await?;
        for review in rows {
            reviews.entry(review.book_id).or_default().push(review);
        }

        Ok(books
            .into_iter()
            .map(|book| BookDetail {
                author: authors.get(&book.author_id).cloned(),
                categories: categories.remove(&book.id).unwrap_or_default(),
                reviews: reviews.remove(&book.id).unwrap_or_default(),
                book,
            })
            .collect())
    }

    pub async fn create_book(
        &self,
        title: &str,
        author_id: i64,
        category_ids: &[i64],
    ) -> Result<Book, ServiceError> {
        let creation_failed = |e: sqlx::Error| match violation(&e) {
            Some(Violation::ForeignKey) => {
                ServiceError::InvalidReference("Book creation failed".to_string())
            }
            _ => ServiceError::Database(e),
        };

        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, author_id) VALUES ($1, $2) RETURNING id, title, author_id",
        )
        .bind(title)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(creation_failed)?;

        link_categories(&mut tx, book.id, category_ids)
            .await
            .map_err(creation_failed)?;

        tx.commit().await?;
        tracing::info!(book_id = book.id, "Book created");
        Ok(book)
    }

    /// Replace title, author and the full category set in one transaction.
    pub async fn update_book(
        &self,
        id: i64,
        title: &str,
        author_id: i64,
        category_ids: &[i64],
    ) -> Result<Book, ServiceError> {
        let update_failed = |e: sqlx::Error| match violation(&e) {
            Some(Violation::ForeignKey) => {
                ServiceError::InvalidReference("Book update failed".to_string())
            }
            _ => ServiceError::Database(e),
        };

        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET title = $2, author_id = $3 WHERE id = $1 RETURNING id, title, author_id",
        )
        .bind(id)
        .bind(title)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(update_failed)?
        .ok_or(ServiceError::NotFound("Book"))?;

        sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        link_categories(&mut tx, id, category_ids)
            .await
            .map_err(update_failed)?;

        tx.commit().await?;
        Ok(book)
    }

    /// Category links and reviews go with the book.
    pub async fn delete_book(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Book"));
        }
        Ok(())
    }

    // ==================== Reviews ====================

    pub async fn reviews_for_book(&self, book_id: i64) -> Result<Vec<ReviewWithUser>, ServiceError> {
        let rows = sqlx::query_as::<_, ReviewUserRow>(
            r#"
            SELECT r.id, r.content, r.rating, r.book_id, r.user_id, r.created_utc,
                   a.username, a.email, a.role, a.created_utc AS account_created_utc
            FROM reviews r
            JOIN accounts a ON a.id = r.user_id
            WHERE r.book_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReviewWithUser::from).collect())
    }

    pub async fn create_review(
        &self,
        content: &str,
        rating: i32,
        book_id: i64,
        user_id: i64,
    ) -> Result<Review, ServiceError> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (content, rating, book_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, content, rating, book_id, user_id, created_utc
            "#,
        )
        .bind(content)
        .bind(rating)
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::ForeignKey) => {
                ServiceError::InvalidReference("Review creation failed".to_string())
            }
            _ => ServiceError::Database(e),
        })
    }

    pub async fn update_review(
        &self,
        id: i64,
        content: &str,
        rating: i32,
    ) -> Result<Review, ServiceError> {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews SET content = $2, rating = $3
            WHERE id = $1
            RETURNING id, content, rating, book_id, user_id, created_utc
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(rating)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("Review"))
    }

    pub async fn delete_review(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Review"));
        }
        Ok(())
    }
}

async fn link_categories(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    book_id: i64,
    category_ids: &[i64],
) -> Result<(), sqlx::Error> {
    let mut ids = category_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    sqlx::query(
        "INSERT INTO book_categories (book_id, category_id) SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(book_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl AccountStore for Database {
    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password_hash, role, created_utc
            FROM accounts
            WHERE lower(email) = lower($1) OR username = $1
            ORDER BY (lower(email) = lower($1)) DESC
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Account, ServiceError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, created_utc
            "#,
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::Unique) => ServiceError::AccountAlreadyExists,
            _ => ServiceError::Database(e),
        })
    }
}

#[async_trait]
impl OwnershipStore for Database {
    async fn find_ownership_record(
        &self,
        resource_id: i64,
    ) -> Result<Option<OwnershipRecord>, anyhow::Error> {
        let row: Option<(i64, i64)> =
            sqlx::query_as("SELECT id, user_id FROM reviews WHERE id = $1")
                .bind(resource_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(resource_id, owner_id)| OwnershipRecord {
            resource_id,
            owner_id,
        }))
    }
}
