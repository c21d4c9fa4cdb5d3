pub mod account;
pub mod author;
pub mod book;
pub mod category;
pub mod review;

pub use account::{Account, AccountResponse, NewAccount};
pub use author::Author;
pub use book::{Book, BookDetail, BookQuery, BookSort, SortOrder};
pub use category::{BookCategoryRow, Category};
pub use review::{Review, ReviewWithUser};
