pub mod articles;
pub mod auth;
pub mod comments;
pub mod likes;
pub mod products;

/// Sort order for offset-paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Newest first, ids break timestamp ties.
    Recent,
    /// Insertion order; ids are monotone, so pages stay stable.
    IdAsc,
}

pub(crate) fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
