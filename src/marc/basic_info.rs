//! Display summary (title, author, year) read from an encoded record

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::encoder::UnimarcDocument;

pub const UNKNOWN_TITLE: &str = "Sem título";
pub const UNKNOWN_AUTHOR: &str = "Autor desconhecido";
pub const UNKNOWN_YEAR: &str = "Ano desconhecido";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BasicInfo {
    pub title: String,
    pub author: String,
    pub year: String,
}

/// Read 200$a (title), 700$a or 710$a (author) and 210$d (year).
/// Missing or empty values fall back to fixed placeholder strings.
pub fn extract_basic_info(document: &UnimarcDocument) -> BasicInfo {
    let title = non_empty(document, "200", 'a').unwrap_or(UNKNOWN_TITLE);
    let author = non_empty(document, "700", 'a')
        .or_else(|| non_empty(document, "710", 'a'))
        .unwrap_or(UNKNOWN_AUTHOR);
    let year = non_empty(document, "210", 'd').unwrap_or(UNKNOWN_YEAR);

    BasicInfo {
        title: title.to_string(),
        author: author.to_string(),
        year: year.to_string(),
    }
}

fn non_empty<'a>(document: &'a UnimarcDocument, tag: &str, code: char) -> Option<&'a str> {
    document.subfield(tag, code).filter(|value| !value.is_empty())
}
