/// Database access layer.
///
/// Free async functions over `&PgPool`; one module per table.
pub mod post_repo;
