//! Generic record helpers.
//!
//! Table and column names cannot be bound as parameters, so every identifier
//! that ends up in a dynamically built statement comes from one of the enums
//! below. Free-form names from requests never reach SQL text.

use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

use crate::DbResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    User,
    Post,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::User, Table::Post];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
        }
    }
}

/// Sortable columns of `v_user_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserStatsSort {
    #[default]
    Username,
    Email,
    PostCount,
    FirstPost,
    LastPost,
}

impl UserStatsSort {
    pub const ALL: [UserStatsSort; 5] = [
        Self::Username,
        Self::Email,
        Self::PostCount,
        Self::FirstPost,
        Self::LastPost,
    ];

    /// Query-string name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::PostCount => "post_count",
            Self::FirstPost => "first_post",
            Self::LastPost => "last_post",
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::PostCount => "post_count",
            Self::FirstPost => "first_post_date",
            Self::LastPost => "last_post_date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown identifier '{0}'")]
pub struct UnknownIdentifier(pub String);

impl FromStr for UserStatsSort {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownIdentifier(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(UnknownIdentifier(other.to_string())),
        }
    }
}

pub fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    schema_object_exists(conn, "table", name)
}

pub fn view_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    schema_object_exists(conn, "view", name)
}

fn schema_object_exists(conn: &Connection, kind: &str, name: &str) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
            (kind, name),
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Both base tables are present.
pub fn database_is_ready(conn: &Connection) -> DbResult<bool> {
    for table in Table::ALL {
        if !table_exists(conn, table.as_str())? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn count_rows(conn: &Connection, table: Table) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}
