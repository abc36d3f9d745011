// Shared helpers for SQL generation

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_name(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn index_name(table: &str, column: &str) -> String {
    format!("{}_{}_idx", table, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_name_escapes_quotes() {
        assert_eq!(quote_name("website_page"), "\"website_page\"");
        assert_eq!(quote_name("we\"ird"), "\"we\"\"ird\"");
    }
}
