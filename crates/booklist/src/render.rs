//! Plain-text rendering of the book list

use std::fmt::Write;

use booklist_core::Book;

/// Render `books` as a numbered list, positions starting at 1
pub fn render_list(books: &[Book]) -> String {
    if books.is_empty() {
        return "(no books yet)\n".to_string();
    }

    let width = books.len().to_string().len();
    let mut out = String::new();
    for (i, book) in books.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{:>width$}. {} - {}",
            i + 1,
            book.name,
            book.author,
            width = width
        );
    }
    out
}
