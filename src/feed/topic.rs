use std::fmt;
use std::str::FromStr;

use super::ChangeEvent;
use super::Table;
use crate::SubscriptionError;

/// `column = value` predicate on the new row of a change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// A (table, filter) pair naming one stream of change events.
///
/// Textual form is `table` or `table:column=value`; the backend's
/// `column=eq.value` spelling is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub table: Table,
    pub filter: Option<Filter>,
}

impl Topic {
    pub fn table(table: Table) -> Self {
        Self { table, filter: None }
    }

    pub fn filtered(
        table: Table,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            table,
            filter: Some(Filter {
                column: column.into(),
                value: value.into(),
            }),
        }
    }

    /// Whether `event` belongs to this topic.
    pub fn matches(
        &self,
        event: &ChangeEvent,
    ) -> bool {
        if event.table != self.table {
            return false;
        }
        match &self.filter {
            None => true,
            Some(filter) => {
                event.new.column(&filter.column).as_deref() == Some(filter.value.as_str())
            }
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.filter {
            None => write!(f, "{}", self.table),
            Some(filter) => write!(f, "{}:{}={}", self.table, filter.column, filter.value),
        }
    }
}

impl FromStr for Topic {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || SubscriptionError::InvalidTopic(s.to_string());

        let (table, filter) = match s.split_once(':') {
            Some((table, filter)) => (table, Some(filter)),
            None => (s, None),
        };
        let table = Table::parse(table.trim()).ok_or_else(invalid)?;

        let Some(filter) = filter else {
            return Ok(Topic::table(table));
        };
        let (column, value) = filter.split_once('=').ok_or_else(invalid)?;
        let value = value.strip_prefix("eq.").unwrap_or(value);
        if column.trim().is_empty() || value.trim().is_empty() {
            return Err(invalid());
        }
        Ok(Topic::filtered(table, column.trim(), value.trim()))
    }
}
