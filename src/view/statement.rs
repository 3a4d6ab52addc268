//! Statement classification by leading keyword.

use std::fmt;

/// What a submitted statement does, judged from its leading keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `CREATE [VIRTUAL] TABLE ...`
    CreateTable,
    /// Any other `CREATE` (index, view, trigger, temporary table).
    /// Temporary tables live only as long as the connection that made
    /// them, so there is nothing to show once the statement returns.
    Create,
    Drop,
    Alter,
    Insert,
    Update,
    Delete,
    /// Everything else, run on the read path
    Read,
}

impl StatementKind {
    /// Classify a statement. Leading whitespace and comments are skipped and
    /// keywords compare case-insensitively.
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let mut words = keywords(skip_leading_comments(sql));
        let Some(first) = words.next() else {
            return StatementKind::Read;
        };

        match first.as_str() {
            "CREATE" => {
                let mut next = words.next();
                if next.as_deref() == Some("VIRTUAL") {
                    next = words.next();
                }
                if next.as_deref() == Some("TABLE") {
                    StatementKind::CreateTable
                } else {
                    StatementKind::Create
                }
            }
            "DROP" => StatementKind::Drop,
            "ALTER" => StatementKind::Alter,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Read,
        }
    }

    /// True for DDL and DML, which run on the write path and are committed
    #[must_use]
    pub fn is_mutating(self) -> bool {
        !matches!(self, StatementKind::Read)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::Create => "CREATE",
            StatementKind::Drop => "DROP",
            StatementKind::Alter => "ALTER",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Read => "READ",
        };
        f.write_str(name)
    }
}

/// True when the statement's first keyword makes it worth remembering as
/// the memo (a pure row-returning query)
#[must_use]
pub fn is_memoizable(sql: &str) -> bool {
    matches!(
        keywords(skip_leading_comments(sql)).next().as_deref(),
        Some("SELECT" | "WITH")
    )
}

/// Name of the table created by a `CREATE TABLE` statement, without quotes
/// or schema prefix. `None` when the statement is not one or the name
/// cannot be read.
#[must_use]
pub fn created_table_name(sql: &str) -> Option<String> {
    let rest = skip_leading_comments(sql);
    let mut rest = expect_keyword(rest, "CREATE")?;
    if let Some(after) = expect_keyword(rest, "VIRTUAL") {
        rest = after;
    }
    rest = expect_keyword(rest, "TABLE")?;
    if let Some(after) = expect_keyword(rest, "IF")
        .and_then(|r| expect_keyword(r, "NOT"))
        .and_then(|r| expect_keyword(r, "EXISTS"))
    {
        rest = after;
    }

    let (name, rest) = read_identifier(rest.trim_start())?;
    // schema-qualified: keep the part after the dot
    match rest.trim_start().strip_prefix('.') {
        Some(after_dot) => read_identifier(after_dot.trim_start()).map(|(table, _)| table),
        None => Some(name),
    }
}

fn expect_keyword<'a>(sql: &'a str, keyword: &str) -> Option<&'a str> {
    let sql = sql.trim_start();
    let end = sql
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(sql.len());
    if sql[..end].eq_ignore_ascii_case(keyword) {
        Some(&sql[end..])
    } else {
        None
    }
}

fn read_identifier(sql: &str) -> Option<(String, &str)> {
    let mut chars = sql.char_indices();
    let (_, first) = chars.next()?;
    let close = match first {
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    };

    if let Some(close) = close {
        let mut name = String::new();
        let body = &sql[1..];
        let mut iter = body.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            if c == close {
                // a doubled quote is an escaped quote
                if close != ']' && iter.peek().map(|&(_, n)| n) == Some(close) {
                    name.push(c);
                    iter.next();
                    continue;
                }
                return Some((name, &body[i + c.len_utf8()..]));
            }
            name.push(c);
        }
        None
    } else {
        let end = sql
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(sql.len());
        if end == 0 {
            return None;
        }
        Some((sql[..end].to_string(), &sql[end..]))
    }
}

/// Skip whitespace, `--` line comments and `/* */` block comments
fn skip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |i| &after[i + 1..]).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]).trim_start();
        } else {
            return rest;
        }
    }
}

/// Upper-cased leading words of a statement
fn keywords(sql: &str) -> impl Iterator<Item = String> + '_ {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(StatementKind::classify("SELECT * FROM t"), StatementKind::Read);
        assert_eq!(StatementKind::classify("  insert into t values (1)"), StatementKind::Insert);
        assert_eq!(StatementKind::classify("Update t SET a = 1"), StatementKind::Update);
        assert_eq!(StatementKind::classify("delete from t"), StatementKind::Delete);
        assert_eq!(StatementKind::classify("DROP TABLE t"), StatementKind::Drop);
        assert_eq!(StatementKind::classify("alter table t add column b"), StatementKind::Alter);
        assert_eq!(StatementKind::classify("PRAGMA table_info(t)"), StatementKind::Read);
        assert_eq!(StatementKind::classify(""), StatementKind::Read);
    }

    #[test]
    fn test_classify_create_variants() {
        assert_eq!(StatementKind::classify("create table t (a)"), StatementKind::CreateTable);
        assert_eq!(
            StatementKind::classify("CREATE  TEMP\nTABLE t (a)"),
            StatementKind::Create
        );
        assert_eq!(
            StatementKind::classify("create temporary table t (a)"),
            StatementKind::Create
        );
        assert_eq!(
            StatementKind::classify("CREATE VIRTUAL TABLE f USING fts5(body)"),
            StatementKind::CreateTable
        );
        assert_eq!(StatementKind::classify("CREATE INDEX i ON t(a)"), StatementKind::Create);
        assert_eq!(StatementKind::classify("CREATE VIEW v AS SELECT 1"), StatementKind::Create);
    }

    #[test]
    fn test_classify_skips_comments() {
        assert_eq!(
            StatementKind::classify("-- add a row\nINSERT INTO t VALUES (1)"),
            StatementKind::Insert
        );
        assert_eq!(
            StatementKind::classify("/* cleanup */ DELETE FROM t"),
            StatementKind::Delete
        );
    }

    #[test]
    fn test_is_mutating() {
        assert!(StatementKind::CreateTable.is_mutating());
        assert!(StatementKind::Delete.is_mutating());
        assert!(!StatementKind::Read.is_mutating());
    }

    #[test]
    fn test_is_memoizable() {
        assert!(is_memoizable("select * from t"));
        assert!(is_memoizable("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!is_memoizable("PRAGMA table_info(t)"));
        assert!(!is_memoizable("INSERT INTO t VALUES (1)"));
    }

    #[test]
    fn test_created_table_name() {
        assert_eq!(created_table_name("CREATE TABLE users (id INT)"), Some("users".into()));
        assert_eq!(
            created_table_name("create table if not exists \"my table\"(id)"),
            Some("my table".into())
        );
        assert_eq!(created_table_name("CREATE TABLE main.t2 (a)"), Some("t2".into()));
        assert_eq!(created_table_name("CREATE TABLE main . aa (a)"), Some("aa".into()));
        assert_eq!(
            created_table_name("CREATE VIRTUAL TABLE \"docs\" USING fts5(body)"),
            Some("docs".into())
        );
        assert_eq!(created_table_name("CREATE TEMP TABLE t (a)"), None);
        assert_eq!(created_table_name("CREATE TABLE [odd name] (a)"), Some("odd name".into()));
        assert_eq!(created_table_name("CREATE TABLE \"a\"\"b\" (a)"), Some("a\"b".into()));
        assert_eq!(created_table_name("CREATE INDEX i ON t(a)"), None);
        assert_eq!(created_table_name("SELECT 1"), None);
    }
}
