//! SQL identifier handling.
//!
//! [`Ident`] represents a schema/table/column name in dotted notation. Parts
//! are stored unquoted and rendered through a [`Dialect`], so the same
//! identifier becomes `"public"."users"` or `` `public`.`users` ``.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts (`"CamelCase"`) allow any characters except NUL and escape `"` as `""`
//! - A trailing `*` part (`u.*`) is kept bare

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Name(String),
    /// `*`, only valid as the last part.
    Star,
}

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Star: `*`, `u.*`
    pub fn parse(s: &str) -> SqlResult<Self> {
        if s.is_empty() {
            return Err(invalid("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(invalid("identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(invalid(format!("trailing '.' in '{s}'")));
                        }
                    }
                    Some(c) => {
                        return Err(invalid(format!(
                            "expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
                if parts.last() == Some(&IdentPart::Star) {
                    return Err(invalid(format!("'*' must be the last part of '{s}'")));
                }
            }

            match chars.peek() {
                Some('*') => {
                    chars.next();
                    parts.push(IdentPart::Star);
                    continue;
                }
                Some('"') => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => {
                                if chars.peek() == Some(&'"') {
                                    chars.next();
                                    name.push('"');
                                } else {
                                    break;
                                }
                            }
                            Some(c) => name.push(c),
                            None => return Err(invalid(format!("unclosed quote in '{s}'"))),
                        }
                    }
                    if name.is_empty() {
                        return Err(invalid("empty quoted identifier"));
                    }
                    parts.push(IdentPart::Name(name));
                    continue;
                }
                _ => {}
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(invalid(format!("invalid character '{c}' in '{s}'")));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(invalid(format!("empty identifier segment in '{s}'")));
            }
            parts.push(IdentPart::Name(name));
        }

        Ok(Self { parts })
    }

    /// Render the identifier, quoting every named part with `dialect`.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let mut out = String::new();
        self.write_sql(dialect, &mut out);
        out
    }

    pub(crate) fn write_sql(&self, dialect: &dyn Dialect, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Name(s) => out.push_str(&dialect.quote_identifier(s)),
                IdentPart::Star => out.push('*'),
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> SqlError {
    SqlError::InvalidIdentifier(message.into())
}

/// Quote `name` if it is a plain identifier; emit anything else verbatim.
///
/// Column slots also accept expressions such as `COUNT(*)` or `total AS t`,
/// which are not identifiers and are passed through untouched.
pub(crate) fn quote_column(dialect: &dyn Dialect, name: &str) -> String {
    match Ident::parse(name) {
        Ok(ident) => ident.to_sql(dialect),
        Err(_) => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.to_sql(&Postgres), "\"users\"");
        assert_eq!(ident.to_sql(&MySql), "`users`");
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("public.users").unwrap();
        assert_eq!(ident.to_sql(&Postgres), "\"public\".\"users\"");
    }

    #[test]
    fn ident_quoted_is_requoted() {
        let ident = Ident::parse(r#""CamelCase"."has""quote""#).unwrap();
        assert_eq!(ident.to_sql(&MySql), "`CamelCase`.`has\"quote`");
    }

    #[test]
    fn ident_star() {
        assert_eq!(Ident::parse("*").unwrap().to_sql(&Postgres), "*");
        assert_eq!(Ident::parse("u.*").unwrap().to_sql(&Postgres), "\"u\".*");
        assert!(Ident::parse("*.id").is_err());
    }

    #[test]
    fn ident_rejects_bad_input() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("1table").is_err());
        assert!(Ident::parse("my table").is_err());
        assert!(Ident::parse("schema..table").is_err());
        assert!(Ident::parse("schema.").is_err());
        assert!(Ident::parse(r#""unclosed"#).is_err());
    }

    #[test]
    fn quote_column_passes_expressions_through() {
        assert_eq!(quote_column(&Postgres, "user_id"), "\"user_id\"");
        assert_eq!(quote_column(&Postgres, "COUNT(*)"), "COUNT(*)");
        assert_eq!(quote_column(&Postgres, "COUNT(*) AS cnt"), "COUNT(*) AS cnt");
    }
}
