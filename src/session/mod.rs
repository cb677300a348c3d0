pub mod sanitize;
pub mod solve;

use crate::session::solve::{Penalty, SolveId, SolveRecord};

/// Ordered solve history plus the record currently open in the detail view.
///
/// Insertion order is chronological and never rearranged; only explicit
/// deletion removes records.
#[derive(Clone, Debug, Default)]
pub struct SolveSession {
    solves: Vec<SolveRecord>,
    detail: Option<SolveId>,
}

impl SolveSession {
    pub fn new(solves: Vec<SolveRecord>) -> Self {
        Self {
            solves,
            detail: None,
        }
    }

    pub fn solves(&self) -> &[SolveRecord] {
        &self.solves
    }

    pub fn len(&self) -> usize {
        self.solves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solves.is_empty()
    }

    pub fn push(&mut self, solve: SolveRecord) -> &SolveRecord {
        self.solves.push(solve);
        &self.solves[self.solves.len() - 1]
    }

    /// Remove a record by id. Closes the detail view if it was showing that record.
    pub fn delete(&mut self, id: &SolveId) -> Option<SolveRecord> {
        let idx = self.solves.iter().position(|s| s.id() == id)?;
        if self.detail.as_ref() == Some(id) {
            self.detail = None;
        }
        Some(self.solves.remove(idx))
    }

    pub fn delete_last(&mut self) -> Option<SolveRecord> {
        let id = self.solves.last()?.id().clone();
        self.delete(&id)
    }

    /// Returns false when no record has this id.
    pub fn apply_penalty(&mut self, id: &SolveId, penalty: Penalty) -> bool {
        match self.solves.iter_mut().find(|s| s.id() == id) {
            Some(solve) => {
                solve.set_penalty(penalty);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.solves.clear();
        self.detail = None;
    }

    pub fn get(&self, id: &SolveId) -> Option<&SolveRecord> {
        self.solves.iter().find(|s| s.id() == id)
    }

    /// 1-based chronological position, 0 when the id is unknown.
    pub fn solve_number(&self, id: &SolveId) -> usize {
        self.solves
            .iter()
            .position(|s| s.id() == id)
            .map_or(0, |idx| idx + 1)
    }

    pub fn open_detail(&mut self, id: &SolveId) -> bool {
        if self.get(id).is_some() {
            self.detail = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail_id(&self) -> Option<&SolveId> {
        self.detail.as_ref()
    }

    pub fn selected_solve(&self) -> Option<&SolveRecord> {
        self.detail.as_ref().and_then(|id| self.get(id))
    }
}
