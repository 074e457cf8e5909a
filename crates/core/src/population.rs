//! The active user population: an immutable, ordered set of records keyed by
//! `user_id`.

use crate::error::{LigaError, LigaResult};
use crate::types::UserRecord;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Population {
    records: Vec<UserRecord>,
    index: HashMap<String, usize>,
}

impl Population {
    /// Build a population, rejecting blank or duplicate user ids.
    pub fn new(records: Vec<UserRecord>) -> LigaResult<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if record.user_id.trim().is_empty() {
                return Err(LigaError::InvalidInput(format!(
                    "record at position {i} has an empty user_id"
                )));
            }
            if index.insert(record.user_id.clone(), i).is_some() {
                return Err(LigaError::InvalidInput(format!(
                    "duplicate user_id {}",
                    record.user_id
                )));
            }
        }
        Ok(Self { records, index })
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the user in listing order.
    pub fn position(&self, user_id: &str) -> LigaResult<usize> {
        self.index
            .get(user_id)
            .copied()
            .ok_or_else(|| LigaError::NotFound(user_id.to_string()))
    }

    pub fn get(&self, user_id: &str) -> LigaResult<&UserRecord> {
        self.position(user_id).map(|i| &self.records[i])
    }
}
