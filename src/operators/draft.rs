//! Draft store — the committed operator draft for one wizard session.

use super::model::{DependentsSection, EmploymentSection, IdentitySection, OperatorDraft};

/// Holds the committed draft plus which steps have validated.
///
/// Sections only enter the store through the `commit_*` methods, which the
/// wizard calls after a step has passed validation.
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    draft: OperatorDraft,
    validated: [bool; 3],
}

impl DraftStore {
    pub fn new(draft: OperatorDraft) -> Self {
        Self {
            draft,
            validated: [false; 3],
        }
    }

    pub fn draft(&self) -> &OperatorDraft {
        &self.draft
    }

    pub fn commit_identity(&mut self, section: IdentitySection) {
        self.draft.identity = section;
        self.validated[0] = true;
    }

    /// Commit step 2, deriving `n_children` from the son list.
    pub fn commit_dependents(&mut self, mut section: DependentsSection) {
        if section.has_minors {
            section.n_children = section.sons.len() as u32;
        } else {
            section.sons.clear();
            section.n_children = 0;
        }
        self.draft.dependents = section;
        self.validated[1] = true;
    }

    /// Commit step 3, defaulting an unset status to active.
    pub fn commit_employment(&mut self, mut section: EmploymentSection) {
        section.status.get_or_insert_default();
        self.draft.employment = section;
        self.validated[2] = true;
    }

    /// All three steps have validated and been committed.
    pub fn is_submit_ready(&self) -> bool {
        self.validated.iter().all(|v| *v)
    }

    /// Hand over the draft, leaving the store empty.
    pub fn take(&mut self) -> OperatorDraft {
        self.validated = [false; 3];
        std::mem::take(&mut self.draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::model::{OperatorStatus, Son};

    #[test]
    fn submit_ready_after_all_commits() {
        let mut store = DraftStore::default();
        assert!(!store.is_submit_ready());
        store.commit_identity(IdentitySection::default());
        store.commit_dependents(DependentsSection::default());
        assert!(!store.is_submit_ready());
        store.commit_employment(EmploymentSection::default());
        assert!(store.is_submit_ready());
    }

    #[test]
    fn dependents_commit_derives_child_count() {
        let mut store = DraftStore::default();
        store.commit_dependents(DependentsSection {
            has_minors: true,
            sons: vec![Son::default(), Son::default()],
            ..Default::default()
        });
        assert_eq!(store.draft().dependents.n_children, 2);

        store.commit_dependents(DependentsSection {
            has_minors: false,
            n_children: 3,
            sons: vec![Son::default()],
            ..Default::default()
        });
        assert_eq!(store.draft().dependents.n_children, 0);
        assert!(store.draft().dependents.sons.is_empty());
    }

    #[test]
    fn employment_commit_defaults_status() {
        let mut store = DraftStore::default();
        store.commit_employment(EmploymentSection::default());
        assert_eq!(store.draft().employment.status, Some(OperatorStatus::Active));

        store.commit_employment(EmploymentSection {
            status: Some(OperatorStatus::Inactive),
            ..Default::default()
        });
        assert_eq!(store.draft().employment.status, Some(OperatorStatus::Inactive));
    }

    #[test]
    fn take_resets_store() {
        let mut store = DraftStore::new(OperatorDraft {
            id_operator: Some(9),
            ..Default::default()
        });
        store.commit_identity(IdentitySection::default());
        let draft = store.take();
        assert_eq!(draft.id_operator, Some(9));
        assert_eq!(store.draft().id_operator, None);
        assert!(!store.is_submit_ready());
    }
}
