//! SQL flavor differences.
//!
//! The builder speaks MySQL by default. The other dialects only change
//! identifier quoting, string literal quoting and the `LIMIT` form.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Target SQL flavor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    #[serde(alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Quote a table or column identifier
    pub fn quote_identifier(self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Quote a string literal
    ///
    /// MySQL literals use double quotes with backslash escaping, which is the
    /// form result SQL has always carried (`col2 IN ("x","y")`).
    pub fn quote_string(self, value: &str) -> String {
        match self {
            Dialect::MySql => {
                let mut out = String::with_capacity(value.len() + 2);
                out.push('"');
                for c in value.chars() {
                    match c {
                        '\\' => out.push_str("\\\\"),
                        '"' => out.push_str("\\\""),
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        other => out.push(other),
                    }
                }
                out.push('"');
                out
            }
            Dialect::Postgres | Dialect::Sqlite => format!("'{}'", value.replace('\'', "''")),
        }
    }

    /// `LIMIT` clause for `rows` rows starting at `offset`
    pub fn limit_clause(self, rows: u64, offset: u64) -> String {
        match self {
            Dialect::MySql => format!("LIMIT {offset}, {rows}"),
            Dialect::Postgres | Dialect::Sqlite => format!("LIMIT {rows} OFFSET {offset}"),
        }
    }

    /// Expression ordering rows randomly
    pub fn random_function(self) -> &'static str {
        match self {
            Dialect::MySql => "RAND()",
            Dialect::Postgres | Dialect::Sqlite => "RANDOM()",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        })
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown SQL dialect: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(Dialect::MySql.quote_identifier("t"), "`t`");
        assert_eq!(Dialect::MySql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(Dialect::Postgres.quote_identifier("t"), "\"t\"");
        assert_eq!(Dialect::Sqlite.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_string_quoting_escapes() {
        assert_eq!(Dialect::MySql.quote_string("x"), "\"x\"");
        assert_eq!(Dialect::MySql.quote_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(Dialect::Postgres.quote_string("it's"), "'it''s'");
    }

    #[test]
    fn test_limit_forms() {
        assert_eq!(Dialect::MySql.limit_clause(5, 2), "LIMIT 2, 5");
        assert_eq!(Dialect::Sqlite.limit_clause(5, 2), "LIMIT 5 OFFSET 2");
    }

    #[test]
    fn test_random_function() {
        assert_eq!(Dialect::MySql.random_function(), "RAND()");
        assert_eq!(Dialect::Postgres.random_function(), "RANDOM()");
    }

    #[test]
    fn test_parse() {
        assert_eq!("MySQL".parse::<Dialect>(), Ok(Dialect::MySql));
        assert_eq!("postgresql".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
    }
}
