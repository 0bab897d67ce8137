//! SQL `CREATE TABLE` extractor
//!
//! Best-effort structural extraction over a restricted dialect. Malformed
//! statements are skipped, never reported as errors.

use super::{Column, Table};
use once_cell::sync::Lazy;
use regex::Regex;

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?si)CREATE\s+TABLE(?:\s+IF\s+NOT\s+EXISTS)?\s+(?:`?(\w+)`?|"?(\w+)"?)\s*\((.*?)\);"#,
    )
    .unwrap()
});

static DEFAULT_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\s+([^,\s]+)").unwrap());

/// Leading keywords of table-level constraint clauses
const CONSTRAINT_KEYWORDS: &[&str] = &[
    "PRIMARY KEY",
    "FOREIGN KEY",
    "UNIQUE",
    "INDEX",
    "KEY",
    "CONSTRAINT",
    "CHECK",
];

/// Extract every `CREATE TABLE` statement in `content`
pub fn extract_sql_tables(content: &str) -> Vec<Table> {
    let content = strip_comments(content);

    CREATE_TABLE
        .captures_iter(&content)
        .filter_map(|caps| {
            let name = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let body = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

            let mut table = Table::new(name);
            for column in parse_columns(body) {
                table.push_column(column);
            }
            Some(table)
        })
        .collect()
}

/// Parse the column definitions of a `CREATE TABLE` body, skipping constraint clauses
pub fn parse_columns(body: &str) -> Vec<Column> {
    split_top_level(body)
        .into_iter()
        .filter_map(parse_column)
        .collect()
}

fn parse_column(fragment: &str) -> Option<Column> {
    let normalized = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() || is_constraint_clause(&normalized.to_uppercase()) {
        return None;
    }

    let (name, definition) = normalized.split_once(' ')?;
    let name = name.trim_matches(|c| c == '`' || c == '"');

    let mut tokens = definition.split(' ');

    // A type like DECIMAL(10, 2) spans tokens until its parenthesis closes
    let mut data_type = tokens.next()?.to_string();
    let mut depth = paren_depth(&data_type);
    for token in tokens {
        if depth <= 0 {
            break;
        }
        data_type.push(' ');
        data_type.push_str(token);
        depth += paren_depth(token);
    }

    if name.is_empty() {
        return None;
    }

    // Flags may be glued to the type, as in `VARCHAR(255)NOT NULL`
    let upper = definition.to_uppercase();

    let mut column = Column::new(name, data_type);
    if contains_phrase(&upper, "PRIMARY KEY") {
        column.primary_key = true;
        column.nullable = false;
    }
    if contains_phrase(&upper, "NOT NULL") {
        column.nullable = false;
    }
    if contains_phrase(&upper, "UNIQUE") {
        column.unique = true;
    }
    column.default = DEFAULT_VALUE
        .captures(definition)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Some(column)
}

/// Blank out `--` line comments and `/* */` block comments outside string literals
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_quote = false;

    while let Some(ch) = chars.next() {
        if in_quote {
            in_quote = ch != '\'';
            out.push(ch);
            continue;
        }

        let next = chars.peek().copied();
        match (ch, next) {
            ('\'', _) => {
                in_quote = true;
                out.push(ch);
            }
            ('-', Some('-')) => {
                if chars.by_ref().any(|c| c == '\n') {
                    out.push('\n');
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Split on commas that sit outside parentheses and single-quoted literals
pub fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut in_quote = false;
    let mut start = 0;

    for (i, ch) in body.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = (depth - 1).max(0),
            ',' if !in_quote && depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());

    parts.retain(|p| !p.is_empty());
    parts
}

fn is_constraint_clause(upper: &str) -> bool {
    CONSTRAINT_KEYWORDS.iter().any(|kw| {
        upper
            .strip_prefix(kw)
            .is_some_and(|rest| !rest.starts_with(is_word_char))
    })
}

/// Whole-word phrase search on an uppercased haystack
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(at, _)| {
        let before_ok = !haystack[..at].ends_with(is_word_char);
        let after_ok = !haystack[at + phrase.len()..].starts_with(is_word_char);
        before_ok && after_ok
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn paren_depth(token: &str) -> i32 {
    token.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sessions_table_with_if_not_exists() {
        let sql = "CREATE TABLE IF NOT EXISTS sessions (id VARCHAR(36) PRIMARY KEY, token TEXT NOT NULL, created_at TIMESTAMP DEFAULT NOW());";
        let tables = extract_sql_tables(sql);

        assert_eq!(tables.len(), 1);
        let sessions = &tables[0];
        assert_eq!(sessions.name, "sessions");
        assert_eq!(sessions.columns.len(), 3);

        let id = &sessions.columns[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.data_type, "VARCHAR(36)");
        assert!(id.primary_key);
        assert!(!id.nullable);

        let token = &sessions.columns[1];
        assert_eq!(token.name, "token");
        assert!(!token.nullable);
        assert!(!token.primary_key);

        let created_at = &sessions.columns[2];
        assert_eq!(created_at.name, "created_at");
        assert_eq!(created_at.default.as_deref(), Some("NOW()"));
        assert!(created_at.nullable);
    }

    #[test]
    fn test_multiline_quoted_names_and_constraints() {
        let sql = r#"
            create table `orders` (
                `id` INT NOT NULL,
                "user_id" INT,
                code VARCHAR(20) UNIQUE,
                PRIMARY KEY (id),
                FOREIGN KEY (user_id) REFERENCES users(id),
                UNIQUE (code),
                KEY idx_user (user_id),
                INDEX idx_code (code),
                CONSTRAINT chk CHECK (id > 0),
                CHECK (user_id > 0)
            );

            CREATE TABLE "line_items" (id INT);
        "#;
        let tables = extract_sql_tables(sql);

        assert_eq!(tables.len(), 2);
        let orders = &tables[0];
        assert_eq!(orders.name, "orders");
        let names: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "user_id", "code"]);
        assert!(orders.columns[2].unique);
        assert!(orders.indexes.is_empty());
        assert!(orders.foreign_keys.is_empty());

        assert_eq!(tables[1].name, "line_items");
    }

    #[test]
    fn test_nested_parentheses_in_types() {
        let sql = "CREATE TABLE prices (amount DECIMAL(10, 2) NOT NULL, kind ENUM('a, b', 'c') DEFAULT 'c');";
        let tables = extract_sql_tables(sql);
        let cols = &tables[0].columns;

        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].data_type, "DECIMAL(10, 2)");
        assert!(!cols[0].nullable);
        assert_eq!(cols[1].name, "kind");
        assert_eq!(cols[1].data_type, "ENUM('a, b', 'c')");
        assert_eq!(cols[1].default.as_deref(), Some("'c'"));
    }

    #[test]
    fn test_column_names_that_start_with_keywords() {
        let sql = "CREATE TABLE t (key_name TEXT, index_no INT, unique_code TEXT, checksum TEXT);";
        let cols = &extract_sql_tables(sql)[0].columns;

        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].name, "key_name");
        assert!(!cols[2].unique);
    }

    #[test]
    fn test_constraint_only_table_is_still_emitted() {
        let sql = "CREATE TABLE links (PRIMARY KEY (a, b));";
        let tables = extract_sql_tables(sql);

        assert_eq!(tables.len(), 1);
        assert!(tables[0].columns.is_empty());
    }

    #[test]
    fn test_malformed_input_yields_nothing() {
        assert!(extract_sql_tables("CREATE TABLE broken (id INT").is_empty());
        assert!(extract_sql_tables("SELECT * FROM users;").is_empty());
        assert!(extract_sql_tables("").is_empty());
    }

    #[test]
    fn test_single_token_fragments_are_skipped() {
        let cols = parse_columns("id INT, orphan, name TEXT");
        let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_comments_do_not_swallow_columns() {
        let sql = "CREATE TABLE users (\n id INT PRIMARY KEY, -- the user's id\n name TEXT,\n email TEXT NOT NULL\n);";
        let cols = &extract_sql_tables(sql)[0].columns;

        let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        assert!(cols[0].primary_key);
        assert!(!cols[2].nullable);
    }

    #[test]
    fn test_block_comments_and_quoted_dashes() {
        let sql = "/* users ( */ CREATE TABLE notes (\n id INT, /* legacy (see #12), keep */\n body TEXT DEFAULT '--',\n tag TEXT -- trailing);\n);";
        let tables = extract_sql_tables(sql);

        assert_eq!(tables.len(), 1);
        let cols = &tables[0].columns;
        let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "body", "tag"]);
        assert_eq!(cols[1].default.as_deref(), Some("'--'"));
    }

    #[test]
    fn test_flags_glued_to_type() {
        let sql = "CREATE TABLE people (name VARCHAR(255)NOT NULL, code CHAR(2)UNIQUE);";
        let cols = &extract_sql_tables(sql)[0].columns;

        assert!(!cols[0].nullable);
        assert!(cols[1].unique);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a INT, b DECIMAL(10,2), c TEXT DEFAULT 'x,y'"),
            vec!["a INT", "b DECIMAL(10,2)", "c TEXT DEFAULT 'x,y'"]
        );
    }
}
