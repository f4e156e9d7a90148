/// Database models for Hearth
///
/// Each model owns its SQL; handlers never build queries directly.
///
/// # Models
///
/// - `account`: Organizer accounts
/// - `event`: Community events and their seat counter
/// - `registration`: Event sign-ups and check-in
/// - `book`, `video`, `article`: Content libraries
/// - `exec_position`: Open executive / volunteer positions with custom questions
/// - `exec_application`: Applications to those positions
/// - `search`: Shared filter and paging helpers for list queries
///
/// # Example
///
/// ```no_run
/// use hearth_shared::db::pool::{create_pool, PoolConfig};
/// use hearth_shared::models::book::Book;
/// use hearth_shared::models::search::ContentFilter;
/// use hearth_shared::pagination::PageRequest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(PoolConfig::default()).await?;
///
/// let filter = ContentFilter {
///     search: Some("gardening".to_string()),
///     category: None,
/// };
/// let page = Book::list(&pool, &filter, &PageRequest::new(1, 20)).await?;
/// println!("{} books", page.pagination.total);
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod article;
pub mod book;
pub mod event;
pub mod exec_application;
pub mod exec_position;
pub mod registration;
pub mod search;
pub mod video;
