//! Defines the `Dialect` trait for database-specific SQL syntax.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a schema or table name) in the correct
    /// quotation marks for the dialect, escaping embedded quotes.
    ///
    /// - PostgreSQL uses double quotes: `"my_table"`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    fn get_placeholder(&self, index: usize) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_escapes_embedded_quotes() {
        assert_eq!(Postgres.quote_identifier("orders"), r#""orders""#);
        assert_eq!(Postgres.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn postgres_placeholders_are_one_based() {
        assert_eq!(Postgres.get_placeholder(0), "$1");
        assert_eq!(Postgres.get_placeholder(2), "$3");
    }
}
