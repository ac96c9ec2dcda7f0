//! Query execution.
//!
//! Every method here consumes the accumulated clauses: after it returns,
//! successfully or not, the query is back in the freshly bound state.

use crate::error::Result;
use crate::executor::DatabaseInterface;
use crate::query::select::{Projection, Query, QueryState};
use crate::record::{FromRecord, Record};
use crate::value::Value;
use std::sync::Arc;

impl<'db, D: DatabaseInterface> Query<'db, D> {
    fn take_state(&mut self) -> QueryState {
        std::mem::take(&mut self.state)
    }

    /// Run the query and return the hydrated records
    ///
    /// With joins, each record carries its children under
    /// [`Record::joined`] and rows are folded by primary key.
    pub fn find(&mut self) -> Result<Vec<Record>> {
        let state = self.take_state();
        let metadata = self.bound()?;
        let sql = self.render(&metadata, &state, Projection::Rows)?;
        let computed: Vec<String> = state.computed.keys().cloned().collect();

        let rows = self.db.fetch_array(&sql)?;
        let records = if state.joins.is_empty() {
            self.db.hydrate_rows(&rows, &metadata, &computed)?
        } else {
            let joined: Vec<_> = state
                .joins
                .values()
                .map(|j| Arc::clone(&j.metadata))
                .collect();
            self.db
                .hydrate_joined_rows(&rows, &metadata, &joined, &computed)?
        };
        Ok(records.into_values().collect())
    }

    /// Same as [`find`](Self::find)
    pub fn exec(&mut self) -> Result<Vec<Record>> {
        self.find()
    }

    /// First record, or `None` when nothing matches
    ///
    /// Without joins the query is limited to one row. With joins the limit is
    /// left alone so the first parent keeps all of its children.
    pub fn first(&mut self) -> Result<Option<Record>> {
        if self.state.joins.is_empty() {
            let offset = self.state.limit.map(|(_, offset)| offset).unwrap_or(0);
            self.state.limit = Some((1, offset));
        }
        Ok(self.find()?.into_iter().next())
    }

    /// Number of matching records; ordering and limit are ignored
    ///
    /// With joins this counts distinct parents, the number of records
    /// [`find`](Self::find) would return without a limit.
    pub fn count(&mut self) -> Result<u64> {
        let state = self.take_state();
        let metadata = self.bound()?;
        let sql = self.render(&metadata, &state, Projection::Count)?;
        self.db.count(&sql)
    }

    /// Values of one column of the bound entity across all matching rows
    pub fn fields(&mut self, column: &str) -> Result<Vec<Value>> {
        let mut state = self.take_state();
        let metadata = self.bound()?;
        let index = metadata.get_table_column_index(column)?;
        state.select.clear();
        let sql = self.render(&metadata, &state, Projection::Rows)?;
        self.db.fetch_column(&sql, index)
    }

    /// [`find`](Self::find) converted into `M`
    pub fn find_as<M: FromRecord>(&mut self) -> Result<Vec<M>> {
        self.find()?.iter().map(M::from_record).collect()
    }

    /// [`first`](Self::first) converted into `M`
    pub fn first_as<M: FromRecord>(&mut self) -> Result<Option<M>> {
        self.first()?.as_ref().map(M::from_record).transpose()
    }
}
