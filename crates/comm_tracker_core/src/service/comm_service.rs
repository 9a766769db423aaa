//! Communication use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for the presentation layer.
//! - Stamp creation dates and route bulk transfers through the repository.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::comm::{today, CommFieldsPatch, CommId, CommRecord, ReviewUpdate};
use crate::repo::comm_repo::{CommRepository, RepoResult};
use crate::transfer::{export_file, import_file, TransferResult};
use std::path::Path;

/// Use-case service wrapper for communication records.
pub struct CommService<R: CommRepository> {
    repo: R,
}

impl<R: CommRepository> CommService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records a new communication dated today.
    ///
    /// Returns the store-assigned id.
    pub fn create_comm(
        &self,
        comm_name: &str,
        comm_type: &str,
        template_id: &str,
    ) -> RepoResult<CommId> {
        self.repo.insert(&today(), comm_name, comm_type, template_id)
    }

    pub fn list_comms(&self) -> RepoResult<Vec<CommRecord>> {
        self.repo.get_all()
    }

    pub fn search_comms(&self, term: &str) -> RepoResult<Vec<CommRecord>> {
        self.repo.search(term)
    }

    pub fn get_comm(&self, id: CommId) -> RepoResult<CommRecord> {
        self.repo.get_by_id(id)
    }

    pub fn update_fields(&self, id: CommId, patch: &CommFieldsPatch) -> RepoResult<()> {
        self.repo.update_fields(id, patch)
    }

    pub fn update_review(&self, id: CommId, review: &ReviewUpdate) -> RepoResult<()> {
        self.repo.update_review(id, review)
    }

    /// Deletes the given ids; ids that do not exist are ignored.
    pub fn delete_comms(&mut self, ids: &[CommId]) -> RepoResult<usize> {
        self.repo.delete(ids)
    }

    pub fn count_comms(&self) -> RepoResult<usize> {
        self.repo.count()
    }

    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> TransferResult<usize> {
        import_file(&mut self.repo, path)
    }

    pub fn export_csv(&self, path: impl AsRef<Path>) -> TransferResult<usize> {
        export_file(&self.repo, path)
    }
}
