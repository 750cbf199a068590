use std::collections::{BTreeSet, HashMap};

use log::{debug, info};

use crate::{
    config::EngineConfig,
    executor::{
        command::{Assignment, ColumnDefinition, ResultSet, WhereClause},
        predicate::{Comparator, Condition, Operation, filter_delete, filter_select, filter_update},
        sequential_scan::SequentialScanner,
    },
    storage::{
        bplus_tree::{BPlusTree, KeyPointer, NodeRef},
        schema::TableSchema,
    },
    types::{
        NO_PAGE, PageNumber, RowId,
        entry::RouterCell,
        error::DatabaseError,
        page::{InteriorPage, LeafPage, Page},
        record::Record,
        value::Value,
    },
};

pub type RecordTree = BPlusTree<KeyPointer<Record>>;

/// A table: column metadata plus a B+Tree of records keyed by row id.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    config: EngineConfig,
    max_record_bytes: usize,
    next_row_id: RowId,
    tree: RecordTree,
}

impl Table {
    pub fn create_table(
        name: &str,
        column_list: &[ColumnDefinition],
        config: EngineConfig,
    ) -> Result<Self, DatabaseError> {
        let columns = column_list
            .iter()
            .enumerate()
            .map(|(position, column)| column.to_schema(position))
            .collect();
        let table = Self::new(TableSchema::new(name, columns)?, config)?;
        info!(
            "created table '{}' ({} columns, {} byte record budget)",
            table.name(),
            table.schema.columns.len(),
            table.max_record_bytes
        );
        Ok(table)
    }

    pub fn new(schema: TableSchema, config: EngineConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        Ok(Self {
            schema,
            config,
            max_record_bytes: config.max_record_bytes(),
            next_row_id: 1,
            tree: BPlusTree::new(config.min_degree)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.table_name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn max_record_bytes(&self) -> usize {
        self.max_record_bytes
    }

    /// Live rows.
    pub fn record_count(&self) -> usize {
        self.tree.len()
    }

    pub fn next_row_id(&self) -> RowId {
        self.next_row_id
    }

    pub fn tree(&self) -> &RecordTree {
        &self.tree
    }

    pub fn get(&self, row_id: RowId) -> Option<&Record> {
        self.tree.get(row_id).map(|entry| &entry.data)
    }

    /// All records in row id order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.tree.iter().map(|entry| &entry.data)
    }

    pub fn insert(
        &mut self,
        column_names: &[String],
        values: Vec<Value>,
    ) -> Result<RowId, DatabaseError> {
        let ordinals = self.resolve_columns(column_names)?;
        if ordinals.len() != values.len() {
            return Err(DatabaseError::ExecutionError {
                details: format!(
                    "{} columns but {} values for table '{}'",
                    ordinals.len(),
                    values.len(),
                    self.name()
                ),
            });
        }

        let mut row = vec![Value::Null; self.schema.columns.len()];
        for (ordinal, value) in ordinals.into_iter().zip(values) {
            row[ordinal] = value;
        }

        let mut coerced = Vec::with_capacity(row.len());
        for (column, value) in self.schema.columns.iter().zip(row) {
            let value = column.data_type.coerce(value)?;
            if value.is_null() && !column.nullable {
                return Err(DatabaseError::NullConstraintViolation {
                    column: column.name.clone(),
                });
            }
            coerced.push(value);
        }

        for (ordinal, column) in self.schema.columns.iter().enumerate() {
            if column.is_unique() && !coerced[ordinal].is_null() {
                let condition = Condition::new(ordinal, Comparator::Eq, coerced[ordinal].clone());
                if !self.scan_matching(&[], Some(&condition)).is_empty() {
                    return Err(DatabaseError::UniquenessViolation {
                        column: column.name.clone(),
                        value: coerced[ordinal].to_string(),
                    });
                }
            }
        }

        let row_id = self.next_row_id;
        let record = Record::new(row_id, coerced);
        self.check_size(&record)?;
        let next_row_id = row_id.checked_add(1).ok_or_else(|| DatabaseError::ExecutionError {
            details: format!("table '{}' ran out of row ids", self.name()),
        })?;

        self.tree.insert(KeyPointer::from(record))?;
        self.next_row_id = next_row_id;
        Ok(row_id)
    }

    /// Returns the number of rows the condition matched. Nothing is written
    /// unless every updated row is valid.
    pub fn update(
        &mut self,
        operation: &Assignment,
        condition: Option<&WhereClause>,
    ) -> Result<usize, DatabaseError> {
        let column_ord = self.schema.resolve(&operation.column_name)?;
        let column = &self.schema.columns[column_ord];
        let value = column.data_type.coerce(operation.value.clone())?;
        if value.is_null() && !column.nullable {
            return Err(DatabaseError::NullConstraintViolation {
                column: column.name.clone(),
            });
        }
        let operation = Operation::new(column_ord, value);
        let condition = condition.map(|c| self.resolve_condition(c)).transpose()?;

        let mut pending = Vec::new();
        let mut holders = 0;
        let mut scanner = SequentialScanner::new(&self.tree);
        while let Some(leaf) = scanner.next_leaf() {
            let originals = leaf.iter().map(|entry| &entry.data);
            let updated = filter_update(originals.clone(), &operation, condition.as_ref())?;

            for (original, record) in originals.zip(updated) {
                let matched = condition.as_ref().is_none_or(|c| c.matches(original));
                if matched {
                    self.check_size(&record)?;
                }
                if record.get_value(column_ord) == Some(&operation.value) {
                    holders += 1;
                }
                if matched {
                    pending.push(record);
                }
            }
        }

        if column.is_unique() && !operation.value.is_null() && holders > 1 {
            return Err(DatabaseError::UniquenessViolation {
                column: column.name.clone(),
                value: operation.value.to_string(),
            });
        }

        let matched = pending.len();
        for record in pending {
            let row_id = record.row_id;
            let entry = self
                .tree
                .get_mut(row_id)
                .ok_or_else(|| DatabaseError::KeyNotFound {
                    key: row_id.to_string(),
                })?;
            entry.data = record;
        }
        Ok(matched)
    }

    /// Returns the number of rows removed.
    pub fn delete(&mut self, condition: Option<&WhereClause>) -> Result<usize, DatabaseError> {
        let Some(condition) = condition else {
            let removed = self.tree.len();
            self.tree.clear();
            debug!("cleared table '{}' ({} rows)", self.name(), removed);
            return Ok(removed);
        };
        let condition = self.resolve_condition(condition)?;

        let mut removed = Vec::new();
        let mut scanner = SequentialScanner::new(&self.tree);
        while let Some(leaf) = scanner.next_leaf() {
            let kept: BTreeSet<RowId> = filter_delete(leaf.iter().map(|e| &e.data), &condition)
                .iter()
                .map(Record::row_id)
                .collect();
            removed.extend(leaf.iter().map(|e| e.id()).filter(|id| !kept.contains(id)));
        }

        for row_id in &removed {
            self.tree.delete(*row_id)?;
        }
        Ok(removed.len())
    }

    pub fn select(
        &self,
        column_names: &[String],
        condition: Option<&WhereClause>,
    ) -> Result<ResultSet, DatabaseError> {
        let ordinals = self.resolve_columns(column_names)?;
        let condition = condition.map(|c| self.resolve_condition(c)).transpose()?;
        let columns = ordinals
            .iter()
            .map(|ordinal| self.schema.columns[*ordinal].name.clone())
            .collect();
        let rows = self
            .scan_matching(&ordinals, condition.as_ref())
            .into_iter()
            .map(|record| record.values)
            .collect();
        Ok(ResultSet::new(columns, rows))
    }

    fn scan_matching(&self, ordinals: &[usize], condition: Option<&Condition>) -> Vec<Record> {
        let mut rows = Vec::new();
        let mut scanner = SequentialScanner::new(&self.tree);
        while let Some(leaf) = scanner.next_leaf() {
            rows.extend(filter_select(
                leaf.iter().map(|entry| &entry.data),
                ordinals,
                condition,
            ));
        }
        rows
    }

    /// Ordinals for the named columns; every column when `names` is empty.
    fn resolve_columns(&self, names: &[String]) -> Result<Vec<usize>, DatabaseError> {
        if names.is_empty() {
            return Ok((0..self.schema.columns.len()).collect());
        }
        let mut ordinals = Vec::with_capacity(names.len());
        for name in names {
            let ordinal = self.schema.resolve(name)?;
            if ordinals.contains(&ordinal) {
                return Err(DatabaseError::ExecutionError {
                    details: format!("column '{}' listed twice", name),
                });
            }
            ordinals.push(ordinal);
        }
        Ok(ordinals)
    }

    fn resolve_condition(&self, clause: &WhereClause) -> Result<Condition, DatabaseError> {
        let column_ord = self.schema.resolve(&clause.column_name)?;
        let value = self.schema.columns[column_ord]
            .data_type
            .coerce(clause.value.clone())?;
        Ok(Condition {
            column_ord,
            comparator: clause.comparator,
            negated: clause.negated,
            value,
        })
    }

    fn check_size(&self, record: &Record) -> Result<(), DatabaseError> {
        let size = record.size();
        if size > self.max_record_bytes {
            return Err(DatabaseError::RecordTooLarge {
                size,
                max: self.max_record_bytes,
            });
        }
        Ok(())
    }

    /// Serialize the tree post-order: children always get lower page numbers
    /// than their parent, so the root is the last page.
    pub fn to_byte_stream(&self) -> Result<Vec<u8>, DatabaseError> {
        let order = self.tree.post_order();
        let pages: HashMap<NodeRef, PageNumber> = order
            .iter()
            .enumerate()
            .map(|(number, node)| (*node, number as PageNumber))
            .collect();
        let page_of = |node: NodeRef| pages.get(&node).copied().unwrap_or(NO_PAGE);
        let parent_page = |parent: Option<usize>| parent.map_or(NO_PAGE, |p| page_of(NodeRef::Internal(p)));

        let page_size = self.config.page_size;
        let mut buffer = Vec::with_capacity(order.len() * page_size);
        for node in &order {
            let page = match *node {
                NodeRef::Leaf(id) => {
                    let leaf = self.tree.leaf(id);
                    Page::Leaf(LeafPage {
                        page_number: page_of(*node),
                        parent: parent_page(leaf.parent()),
                        next_leaf: leaf.next().map_or(NO_PAGE, |n| page_of(NodeRef::Leaf(n))),
                        records: leaf.entries().iter().map(|e| e.data.clone()).collect(),
                    })
                }
                NodeRef::Internal(id) => {
                    let internal = self.tree.internal(id);
                    let children = internal.children();
                    let cells = internal
                        .keys()
                        .iter()
                        .zip(children)
                        .map(|(key, child)| RouterCell::new(*key, page_of(*child)))
                        .collect();
                    Page::Interior(InteriorPage {
                        page_number: page_of(*node),
                        parent: parent_page(internal.parent()),
                        right_pointer: children.last().map_or(NO_PAGE, |c| page_of(*c)),
                        cells,
                    })
                }
            };
            buffer.extend(page.to_byte_stream(page_size)?);
        }

        info!(
            "serialized table '{}': {} rows in {} pages",
            self.name(),
            self.tree.len(),
            order.len()
        );
        Ok(buffer)
    }

    /// Rebuild a table from a page stream by reinserting every record in
    /// row id order. Any malformed page aborts the whole load.
    ///
    /// `next_row_id` is the counter recorded by the catalog; the loaded
    /// table never hands out an id below it or below any stored row.
    pub fn from_byte_stream(
        schema: TableSchema,
        config: EngineConfig,
        next_row_id: RowId,
        bytes: &[u8],
    ) -> Result<Self, DatabaseError> {
        let mut table = Self::new(schema, config)?;
        let page_size = config.page_size;
        if bytes.len() % page_size != 0 {
            return Err(DatabaseError::InvalidPageSize {
                expected: page_size,
                actual: bytes.len() % page_size,
            });
        }

        let pages = bytes
            .chunks_exact(page_size)
            .enumerate()
            .map(|(number, chunk)| Page::from_byte_stream(chunk, number as PageNumber))
            .collect::<Result<Vec<_>, _>>()?;
        table.validate_pages(&pages)?;

        let columns = table.schema.columns.len();
        let mut records = Vec::new();
        for page in pages {
            if let Page::Leaf(leaf) = page {
                for record in leaf.records {
                    if record.num_columns() != columns {
                        return Err(DatabaseError::MalformedPage {
                            page_number: leaf.page_number,
                            reason: format!(
                                "row {} has {} columns, table '{}' has {}",
                                record.row_id,
                                record.num_columns(),
                                table.name(),
                                columns
                            ),
                        });
                    }
                    records.push(record);
                }
            }
        }
        records.sort_by_key(Record::row_id);

        let next_row_id = records
            .last()
            .map_or(1, |r| r.row_id.saturating_add(1))
            .max(next_row_id);
        for record in records {
            table.tree.insert(KeyPointer::from(record))?;
        }
        table.next_row_id = next_row_id;

        info!(
            "loaded table '{}': {} rows, tree height {}",
            table.name(),
            table.tree.len(),
            table.tree.height()
        );
        Ok(table)
    }

    /// Exactly one root, and every page reference stays inside the stream.
    fn validate_pages(&self, pages: &[Page]) -> Result<(), DatabaseError> {
        if pages.is_empty() {
            return Ok(());
        }
        let count = pages.len() as PageNumber;
        let in_range = |page: PageNumber| page == NO_PAGE || page < count;

        let roots: Vec<PageNumber> = pages
            .iter()
            .filter(|p| p.parent() == NO_PAGE)
            .map(Page::page_number)
            .collect();
        if roots.len() != 1 {
            return Err(DatabaseError::MalformedPage {
                page_number: roots.get(1).copied().unwrap_or(0),
                reason: format!("expected one root page, found {}", roots.len()),
            });
        }

        for page in pages {
            let references = match page {
                Page::Leaf(leaf) => vec![leaf.parent, leaf.next_leaf],
                Page::Interior(interior) => {
                    let mut refs = interior.children();
                    refs.push(interior.parent);
                    refs
                }
            };
            if let Some(bad) = references.into_iter().find(|r| !in_range(*r)) {
                return Err(DatabaseError::MalformedPage {
                    page_number: page.page_number(),
                    reason: format!("reference to page {} outside the table", bad),
                });
            }
        }
        Ok(())
    }
}
