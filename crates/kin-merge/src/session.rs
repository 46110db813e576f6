//! State shared by the nested merges of one top-level call.

use std::collections::BTreeSet;

use kin_store::Transaction;
use kin_types::{EntityKind, Family, Handle, Person};

use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::summary::MergeSummary;

pub(crate) struct Session<'a> {
    pub(crate) txn: Transaction<'a>,
    pub(crate) config: &'a MergeConfig,
    depth: usize,
    /// Families held by enclosing family merges. They must outlive any
    /// collapse triggered underneath.
    protected: Vec<Handle>,
    families_touched: BTreeSet<Handle>,
    families_collapsed: Vec<Handle>,
    persons_merged: Vec<Handle>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(txn: Transaction<'a>, config: &'a MergeConfig) -> Self {
        Self {
            txn,
            config,
            depth: 0,
            protected: Vec::new(),
            families_touched: BTreeSet::new(),
            families_collapsed: Vec::new(),
            persons_merged: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self) -> MergeResult<()> {
        if self.depth >= self.config.max_cascade_depth {
            return Err(MergeError::CascadeDepthExceeded {
                depth: self.config.max_cascade_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn protect(&mut self, families: [Handle; 2]) {
        self.protected.extend(families);
    }

    pub(crate) fn unprotect(&mut self) {
        let keep = self.protected.len().saturating_sub(2);
        self.protected.truncate(keep);
    }

    pub(crate) fn is_protected(&self, family: &Handle) -> bool {
        self.protected.contains(family)
    }

    /// The candidate held by the outermost enclosing family merge.
    pub(crate) fn outermost_protected(&self, candidates: &[Handle]) -> Option<Handle> {
        self.protected
            .iter()
            .find(|h| candidates.contains(h))
            .copied()
    }

    pub(crate) fn load_person(&self, handle: &Handle) -> MergeResult<Person> {
        self.txn
            .get_person(handle)?
            .ok_or(MergeError::NotFound {
                kind: EntityKind::Person,
                handle: *handle,
            })
    }

    pub(crate) fn load_family(&self, handle: &Handle) -> MergeResult<Family> {
        self.txn
            .get_family(handle)?
            .ok_or(MergeError::NotFound {
                kind: EntityKind::Family,
                handle: *handle,
            })
    }

    pub(crate) fn touch_family(&mut self, family: Handle) {
        self.families_touched.insert(family);
    }

    pub(crate) fn record_collapsed(&mut self, family: Handle) {
        self.families_collapsed.push(family);
    }

    pub(crate) fn record_merged(&mut self, person: Handle) {
        self.persons_merged.push(person);
    }

    /// Publish the transaction and report what it did.
    pub(crate) fn finish(self, kind: EntityKind, survivor: Handle) -> MergeResult<MergeSummary> {
        let Session {
            txn,
            families_touched,
            families_collapsed,
            persons_merged,
            ..
        } = self;
        txn.commit()?;
        let families_touched = families_touched
            .into_iter()
            .filter(|f| !families_collapsed.contains(f))
            .collect();
        Ok(MergeSummary {
            kind,
            survivor,
            families_touched,
            families_collapsed,
            persons_merged,
        })
    }

    pub(crate) fn abort(self) {
        self.txn.rollback();
    }
}
