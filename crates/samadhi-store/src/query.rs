//! Filtered, ordered selection of catalog records
//!
//! [`Select`] is a small builder over one entity table. Nothing touches the
//! database until one of the `fetch_*`, [`Select::count`] or
//! [`Select::delete`] methods is awaited, and every column name is checked
//! against the table definition before any SQL is produced.

use sqlx::any::{AnyArguments, AnyQueryResult};
use sqlx::Arguments;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use crate::entity::Entity;
use crate::error::{Result, StoreError};
use crate::session::{Backend, Session};

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(Option<i64>),
    Real(Option<f64>),
    Text(Option<String>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(Some(value))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(value: Option<i64>) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(Some(value))
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(value: Option<f64>) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(Some(value))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&Option<String>> for SqlValue {
    fn from(value: &Option<String>) -> Self {
        SqlValue::Text(value.clone())
    }
}

/// Pack values into driver arguments, in placeholder order
pub(crate) fn arguments<'q>(values: Vec<SqlValue>) -> Result<AnyArguments<'q>> {
    let mut args = AnyArguments::default();
    for value in values {
        let added = match value {
            SqlValue::Integer(v) => args.add(v),
            SqlValue::Real(v) => args.add(v),
            SqlValue::Text(v) => args.add(v),
        };
        added.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

/// Execute a statement that returns no rows
pub(crate) async fn execute(
    session: &Session,
    sql: &str,
    values: Vec<SqlValue>,
) -> Result<AnyQueryResult> {
    debug!(sql = %sql, "Executing statement");
    let result = sqlx::query_with(sql, arguments(values)?)
        .execute(session.pool())
        .await?;
    Ok(result)
}

/// Shell-style wildcard pattern (`*` for any run, `?` for one character)
///
/// Converted to a SQL `LIKE` pattern with `\` as the escape character, so
/// literal `%` and `_` in the input match only themselves.
///
/// ```rust
/// use samadhi_store::WildcardPattern;
///
/// let pattern = WildcardPattern::new("ttbar_*");
/// assert_eq!(pattern.as_like(), r"ttbar\_%");
/// assert!(pattern.matches("ttbar_powheg"));
/// assert!(!pattern.matches("ttbarX"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    like: String,
}

#[derive(Debug, Clone, Copy)]
enum LikeToken {
    AnyRun,
    AnyOne,
    Literal(char),
}

impl WildcardPattern {
    pub fn new(glob: &str) -> Self {
        let mut like = String::with_capacity(glob.len());
        for c in glob.chars() {
            match c {
                '*' => like.push('%'),
                '?' => like.push('_'),
                '%' | '_' | '\\' => {
                    like.push('\\');
                    like.push(c);
                }
                _ => like.push(c),
            }
        }
        Self { like }
    }

    /// The pattern in `LIKE ... ESCAPE '\'` form
    pub fn as_like(&self) -> &str {
        &self.like
    }

    fn tokens(&self) -> Vec<LikeToken> {
        let mut tokens = Vec::new();
        let mut chars = self.like.chars();
        while let Some(c) = chars.next() {
            tokens.push(match c {
                '%' => LikeToken::AnyRun,
                '_' => LikeToken::AnyOne,
                '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
                other => LikeToken::Literal(other),
            });
        }
        tokens
    }

    /// Evaluate the pattern in memory with SQLite `LIKE` rules
    /// (ASCII letters compare case-insensitively)
    pub fn matches(&self, candidate: &str) -> bool {
        let tokens = self.tokens();
        let text: Vec<char> = candidate.chars().collect();

        // reachable[j]: the tokens consumed so far can match text[..j]
        let mut reachable = vec![false; text.len() + 1];
        reachable[0] = true;
        for token in tokens {
            let mut next = vec![false; text.len() + 1];
            match token {
                LikeToken::AnyRun => {
                    let mut seen = false;
                    for j in 0..=text.len() {
                        seen |= reachable[j];
                        next[j] = seen;
                    }
                }
                LikeToken::AnyOne => {
                    for j in 0..text.len() {
                        next[j + 1] = reachable[j];
                    }
                }
                LikeToken::Literal(expected) => {
                    for j in 0..text.len() {
                        next[j + 1] = reachable[j] && text[j].eq_ignore_ascii_case(&expected);
                    }
                }
            }
            reachable = next;
        }
        reachable[text.len()]
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.like)
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Equals(&'static str, SqlValue),
    IsNull(&'static str),
    Like(&'static str, String),
    /// `id_column IN (SELECT id_column FROM link WHERE key_column = key)`
    Linked {
        link_table: &'static str,
        key_column: &'static str,
        key: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    IdAscending,
    IdDescending,
}

/// Lazily evaluated selection over one entity table
///
/// Borrows the [`Session`], so it cannot outlive the scope that opened it.
#[must_use = "a Select does nothing until it is fetched"]
pub struct Select<'s, E> {
    session: &'s Session,
    conditions: Vec<Condition>,
    unknown: Option<String>,
    order: Option<Order>,
    limit: Option<i64>,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Entity> Select<'s, E> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            conditions: Vec::new(),
            unknown: None,
            order: None,
            limit: None,
            _entity: PhantomData,
        }
    }

    fn column(&mut self, name: &str) -> Option<&'static str> {
        let found = E::TABLE.column(name).map(|c| c.name);
        if found.is_none() && self.unknown.is_none() {
            self.unknown = Some(name.to_string());
        }
        found
    }

    /// Restrict to the record with primary key `id`
    pub fn with_id(self, id: i64) -> Self {
        self.where_eq(E::ID_COLUMN, id)
    }

    /// `column = value`; a `None` value becomes `column IS NULL`
    pub fn where_eq(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        if let Some(column) = self.column(column) {
            let condition = match value.into() {
                SqlValue::Integer(None) | SqlValue::Real(None) | SqlValue::Text(None) => {
                    Condition::IsNull(column)
                }
                value => Condition::Equals(column, value),
            };
            self.conditions.push(condition);
        }
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        if let Some(column) = self.column(column) {
            self.conditions.push(Condition::IsNull(column));
        }
        self
    }

    /// `column LIKE pattern`
    pub fn where_like(mut self, column: &str, pattern: &WildcardPattern) -> Self {
        if let Some(column) = self.column(column) {
            self.conditions
                .push(Condition::Like(column, pattern.as_like().to_string()));
        }
        self
    }

    /// Keep records whose id appears in `link_table` next to `key` in
    /// `key_column` (many-to-many association tables)
    pub fn linked_through(mut self, link_table: &'static str, key_column: &'static str, key: i64) -> Self {
        self.conditions.push(Condition::Linked {
            link_table,
            key_column,
            key,
        });
        self
    }

    pub fn order_by_id(mut self) -> Self {
        self.order = Some(Order::IdAscending);
        self
    }

    pub fn order_by_id_desc(mut self) -> Self {
        self.order = Some(Order::IdDescending);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn where_clause(&self) -> Result<(String, Vec<SqlValue>)> {
        if let Some(column) = &self.unknown {
            return Err(StoreError::UnknownColumn {
                table: E::TABLE.name,
                column: column.clone(),
            });
        }

        // MySQL string literals treat the backslash as an escape themselves.
        let escape = match self.session.backend() {
            Backend::Sqlite => r"'\'",
            Backend::MySql => r"'\\'",
        };
        let mut values = Vec::new();
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Equals(column, value) => {
                    values.push(value.clone());
                    format!("{column} = ?")
                }
                Condition::IsNull(column) => format!("{column} IS NULL"),
                Condition::Like(column, pattern) => {
                    values.push(SqlValue::Text(Some(pattern.clone())));
                    format!("{column} LIKE ? ESCAPE {escape}")
                }
                Condition::Linked {
                    link_table,
                    key_column,
                    key,
                } => {
                    values.push(SqlValue::Integer(Some(*key)));
                    format!(
                        "{id} IN (SELECT {id} FROM {link_table} WHERE {key_column} = ?)",
                        id = E::ID_COLUMN
                    )
                }
            })
            .collect();

        if clauses.is_empty() {
            Ok((String::new(), values))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), values))
        }
    }

    /// The `SELECT` statement and its parameters
    pub fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let (filter, values) = self.where_clause()?;
        let columns: Vec<&str> = E::TABLE.columns.iter().map(|c| c.name).collect();
        let mut sql = format!("SELECT {} FROM {}{}", columns.join(", "), E::TABLE.name, filter);
        match self.order {
            Some(Order::IdAscending) => sql.push_str(&format!(" ORDER BY {} ASC", E::ID_COLUMN)),
            Some(Order::IdDescending) => sql.push_str(&format!(" ORDER BY {} DESC", E::ID_COLUMN)),
            None => {}
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok((sql, values))
    }

    pub async fn fetch_all(self) -> Result<Vec<E>> {
        let (sql, values) = self.to_sql()?;
        debug!(sql = %sql, "Selecting records");
        let records = sqlx::query_as_with::<_, E, _>(&sql, arguments(values)?)
            .fetch_all(self.session.pool())
            .await?;
        Ok(records)
    }

    pub async fn fetch_optional(self) -> Result<Option<E>> {
        let (sql, values) = self.to_sql()?;
        debug!(sql = %sql, "Selecting record");
        let record = sqlx::query_as_with::<_, E, _>(&sql, arguments(values)?)
            .fetch_optional(self.session.pool())
            .await?;
        Ok(record)
    }

    /// Like [`Select::fetch_optional`], but no match is an error
    pub async fn fetch_one(self) -> Result<E> {
        self.fetch_optional()
            .await?
            .ok_or(StoreError::NoMatch(E::NAME))
    }

    /// Number of matching records; ordering and limit are ignored
    pub async fn count(self) -> Result<i64> {
        let (filter, values) = self.where_clause()?;
        let sql = format!("SELECT COUNT(*) FROM {}{}", E::TABLE.name, filter);
        debug!(sql = %sql, "Counting records");
        let count = sqlx::query_scalar_with::<_, i64, _>(&sql, arguments(values)?)
            .fetch_one(self.session.pool())
            .await?;
        Ok(count)
    }

    /// Delete every matching record in one statement
    pub async fn delete(self) -> Result<u64> {
        let (filter, values) = self.where_clause()?;
        let sql = format!("DELETE FROM {}{}", E::TABLE.name, filter);
        let result = execute(self.session, &sql, values).await?;
        Ok(result.rows_affected())
    }
}
