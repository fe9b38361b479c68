use std::any::TypeId;
use std::fmt;

use log::debug;

use crate::column::{Column, MemoryResource, Value};
use crate::conf::TableConfig;
use crate::core::{ColumnError, Kind};

/// One named, typed column of a [`Table`].
///
/// `category` is an opaque type-identity tag that higher layers use to attach
/// meaning to a column; the table only stores and filters by it.
#[derive(Debug)]
pub struct TableColumn<'a> {
    pub category: TypeId,
    pub name: &'a str,
    pub data: Column<'a>,
}

impl<'a> TableColumn<'a> {
    pub fn new(category: TypeId, name: &'a str, data: Column<'a>) -> Self {
        Self {
            category,
            name,
            data,
        }
    }

    pub fn kind(&self) -> Kind {
        self.data.kind()
    }

    pub fn get(&self, pos: u32) -> Result<Value<'_>, ColumnError> {
        self.data.get(pos)
    }
}

/// Ordered list of named columns. Columns keep their insertion order and
/// names are unique.
#[derive(Default)]
pub struct Table<'a> {
    name: &'a str,
    res: Option<&'a dyn MemoryResource>,
    columns: Vec<TableColumn<'a>>,
}

impl<'a> Table<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            res: None,
            columns: Vec::new(),
        }
    }

    /// A table whose columns allocate from `res`.
    pub fn with_resource(name: &'a str, res: &'a dyn MemoryResource) -> Self {
        Self {
            name,
            res: Some(res),
            columns: Vec::new(),
        }
    }

    /// Build an empty table with the configured columns, each tagged with its
    /// kind's default category and reserved to its configured size.
    pub fn from_config(
        config: &'a TableConfig,
        res: Option<&'a dyn MemoryResource>,
    ) -> Result<Self, ColumnError> {
        let mut table = Self {
            name: &config.name,
            res,
            columns: Vec::with_capacity(config.columns.len()),
        };
        for column in &config.columns {
            table
                .add_column(column.kind.default_category(), &column.name, column.kind)?
                .reserve(column.reserve)?;
        }
        debug!(
            "Table '{}' built from config with {} columns",
            table.name,
            table.columns.len()
        );
        Ok(table)
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[TableColumn<'a>] {
        &self.columns
    }

    /// Append an empty column using the table's resource.
    pub fn add_column(
        &mut self,
        category: TypeId,
        name: &'a str,
        kind: Kind,
    ) -> Result<&mut Column<'a>, ColumnError> {
        let data = match self.res {
            Some(res) => Column::with_resource(kind, res),
            None => Column::new(kind),
        };
        self.push(TableColumn::new(category, name, data))
    }

    /// Append an existing column.
    pub fn push(&mut self, column: TableColumn<'a>) -> Result<&mut Column<'a>, ColumnError> {
        if self.position(column.name).is_some() {
            return Err(ColumnError::TableError(format!(
                "duplicate column '{}' in table '{}'",
                column.name, self.name
            )));
        }
        debug!(
            "Table '{}': added {} column '{}'",
            self.name,
            column.kind(),
            column.name
        );
        self.columns.push(column);
        let last = self.columns.len() - 1;
        Ok(&mut self.columns[last].data)
    }

    pub fn column(&self, name: &str) -> Option<&TableColumn<'a>> {
        self.position(name).map(|i| &self.columns[i])
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut TableColumn<'a>> {
        self.position(name).map(|i| &mut self.columns[i])
    }

    pub fn by_category(&self, category: TypeId) -> impl Iterator<Item = &TableColumn<'a>> {
        self.columns.iter().filter(move |c| c.category == category)
    }

    /// Read the cell at `pos` of the named column.
    pub fn get(&self, name: &str, pos: u32) -> Result<Value<'_>, ColumnError> {
        self.column(name)
            .ok_or_else(|| {
                ColumnError::TableError(format!(
                    "no column '{}' in table '{}'",
                    name, self.name
                ))
            })?
            .get(pos)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("resource", &self.res.is_some())
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Timestamp;

    #[test]
    fn test_add_and_lookup() {
        let mut table = Table::new("events");
        table
            .add_column(TypeId::of::<Timestamp>(), "ts", Kind::Int)
            .unwrap()
            .resize(2)
            .unwrap();
        table.add_column(Kind::Float.default_category(), "score", Kind::Float).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column("ts").map(TableColumn::kind), Some(Kind::Int));
        assert!(table.column("missing").is_none());

        let by_ts: Vec<_> = table
            .by_category(TypeId::of::<Timestamp>())
            .map(|c| c.name)
            .collect();
        assert_eq!(by_ts, vec!["ts"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table = Table::new("events");
        table.add_column(TypeId::of::<i64>(), "id", Kind::Int).unwrap();
        let err = table
            .add_column(TypeId::of::<i64>(), "id", Kind::Float)
            .unwrap_err();
        assert_eq!(
            err,
            ColumnError::TableError("duplicate column 'id' in table 'events'".into())
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_get_through_table() {
        let mut table = Table::new("events");
        let ids = table.add_column(TypeId::of::<i64>(), "id", Kind::Int).unwrap();
        ids.resize(1).unwrap();
        ids.set_int(0, Some(9)).unwrap();

        assert_eq!(table.get("id", 0), Ok(Value::Int(9)));
        assert_eq!(
            table.get("id", 1),
            Err(ColumnError::OutOfRange { pos: 1, size: 1 })
        );
        assert!(matches!(
            table.get("nope", 0),
            Err(ColumnError::TableError(_))
        ));
    }
}
