//! SQL scripts: splitting text into statements and running them in order.

use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::storage::table::ResultSet;

use super::conversion::value_from_sql;
use super::error::{QueryError, Result};

/// An ordered list of SQL statements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    statements: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    SingleQuote,
    DoubleQuote,
    Bracket,
    Backtick,
    LineComment,
    BlockComment,
}

impl Script {
    /// Splits `text` on `;` terminators that appear outside string literals,
    /// quoted identifiers and comments. Fragments holding only whitespace or
    /// comments are dropped; a final unterminated statement is kept.
    pub fn parse(text: &str) -> Self {
        let mut statements = Vec::new();
        let mut current = String::new();
        let mut has_code = false;
        let mut state = State::Code;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match state {
                State::Code => match c {
                    ';' => {
                        if has_code {
                            statements.push(current.trim().to_string());
                        }
                        current.clear();
                        has_code = false;
                        continue;
                    }
                    '-' if chars.peek() == Some(&'-') => state = State::LineComment,
                    '/' if chars.peek() == Some(&'*') => {
                        current.push(c);
                        if let Some(star) = chars.next() {
                            current.push(star);
                        }
                        state = State::BlockComment;
                        continue;
                    }
                    '\'' => state = State::SingleQuote,
                    '"' => state = State::DoubleQuote,
                    '[' => state = State::Bracket,
                    '`' => state = State::Backtick,
                    _ => {}
                },
                State::SingleQuote if c == '\'' => state = State::Code,
                State::DoubleQuote if c == '"' => state = State::Code,
                State::Bracket if c == ']' => state = State::Code,
                State::Backtick if c == '`' => state = State::Code,
                State::LineComment if c == '\n' => state = State::Code,
                State::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                    current.push(c);
                    if let Some(slash) = chars.next() {
                        current.push(slash);
                    }
                    state = State::Code;
                    continue;
                }
                _ => {}
            }

            let in_comment = matches!(state, State::LineComment | State::BlockComment);
            if !in_comment && !c.is_whitespace() {
                has_code = true;
            }
            current.push(c);
        }

        if has_code {
            statements.push(current.trim().to_string());
        }

        Self { statements }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(QueryError::InputNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl From<Vec<String>> for Script {
    fn from(statements: Vec<String>) -> Self {
        Self { statements }
    }
}

/// Executes every statement in order and returns the result of the last one
/// that produced a result set. The first failing statement aborts the rest.
pub fn execute(conn: &Connection, script: &Script) -> Result<Option<ResultSet>> {
    if script.is_empty() {
        return Err(QueryError::EmptyScript);
    }

    let mut last_result = None;

    for (i, sql) in script.statements().iter().enumerate() {
        let index = i + 1;
        tracing::debug!(index, sql = sql.as_str(), "executing statement");

        match run_statement(conn, sql) {
            Ok(Some(result)) => last_result = Some(result),
            Ok(None) => {}
            Err(e) => {
                return Err(QueryError::SqlExecution {
                    index,
                    message: e.to_string(),
                })
            }
        }
    }

    Ok(last_result)
}

fn run_statement(conn: &Connection, sql: &str) -> rusqlite::Result<Option<ResultSet>> {
    let mut stmt = conn.prepare(sql)?;

    if stmt.column_count() == 0 {
        let changed = stmt.execute([])?;
        tracing::debug!(changed, "statement executed for effect");
        return Ok(None);
    }

    let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = column_names.len();
    let mut rows = stmt.query([])?;
    let mut values = Vec::new();

    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(width);
        for i in 0..width {
            record.push(value_from_sql(row.get_ref(i)?));
        }
        values.push(record);
    }

    Ok(Some(ResultSet::new(column_names, values)))
}
