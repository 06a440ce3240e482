//! Best-fit table allocation.
//!
//! Availability is status-based only: a table is free unless its in-memory
//! status is `reserved`. The requested date and time are accepted for a
//! future availability calendar but do not filter candidates, so a table
//! reserved for any date blocks every date.

use serde::Serialize;

use crate::catalog::TableGroup;
use crate::domain::reservation::ConfirmationCode;
use crate::domain::table::{Table, TableId, TableStatus};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub waste: u32,
    pub table_id: TableId,
    pub table: Table,
}

#[derive(Clone, Debug)]
pub struct TableInventory {
    restaurant: String,
    tables: Vec<Table>,
}

impl TableInventory {
    /// Expands `(size, count)` groups into tables `T1..Tn` in group order.
    pub fn from_groups(restaurant: impl Into<String>, groups: &[TableGroup]) -> Self {
        let tables = groups
            .iter()
            .flat_map(|group| std::iter::repeat(group.size).take(group.count as usize))
            .enumerate()
            .map(|(index, size)| Table::new(TableId::numbered(index + 1), size))
            .collect();

        Self { restaurant: restaurant.into(), tables }
    }

    /// Free tables seating at least `party_size`, least waste first. Ties keep
    /// inventory order.
    pub fn available_tables(&self, party_size: u32, _date: &str, _time: &str) -> Vec<Candidate> {
        let mut candidates = self
            .tables
            .iter()
            .filter(|table| table.is_available() && table.size >= party_size)
            .map(|table| Candidate {
                waste: table.size - party_size,
                table_id: table.id.clone(),
                table: table.clone(),
            })
            .collect::<Vec<_>>();
        candidates.sort_by_key(|candidate| candidate.waste);
        candidates
    }

    pub fn best_fit(&self, party_size: u32, date: &str, time: &str) -> Option<Candidate> {
        self.available_tables(party_size, date, time).into_iter().next()
    }

    pub fn reserve(
        &mut self,
        table_id: &TableId,
        confirmation_code: &ConfirmationCode,
    ) -> Result<(), DomainError> {
        let restaurant = self.restaurant.clone();
        let table = self.table_mut(table_id)?;
        if !table.is_available() {
            return Err(DomainError::TableUnavailable {
                restaurant,
                table_id: table_id.clone(),
            });
        }

        table.status = TableStatus::Reserved;
        table.reservation = Some(confirmation_code.clone());
        Ok(())
    }

    pub fn release(&mut self, table_id: &TableId) -> Result<(), DomainError> {
        let table = self.table_mut(table_id)?;
        table.status = TableStatus::Available;
        table.reservation = None;
        Ok(())
    }

    pub fn get(&self, table_id: &TableId) -> Option<&Table> {
        self.tables.iter().find(|table| &table.id == table_id)
    }

    pub fn contains(&self, table_id: &TableId) -> bool {
        self.get(table_id).is_some()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.tables.iter().filter(|table| table.is_available()).count()
    }

    pub fn reserved_count(&self) -> usize {
        self.len() - self.available_count()
    }

    fn table_mut(&mut self, table_id: &TableId) -> Result<&mut Table, DomainError> {
        let restaurant = &self.restaurant;
        match self.tables.iter_mut().find(|table| &table.id == table_id) {
            Some(table) => Ok(table),
            None => Err(DomainError::UnknownTable {
                restaurant: restaurant.clone(),
                table_id: table_id.clone(),
            }),
        }
    }
}
