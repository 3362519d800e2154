// Child-collection reconciliation.
//
// Converges an invoice's persisted child rows (items, adjustments) to a
// client-supplied desired list by computing the minimal set of create,
// update, and delete operations. The diff itself is pure; the repository
// applies the resulting plan inside a single transaction.

use std::collections::HashSet;

use crate::core::{AppError, Result};

/// A desired child entry: an identity referencing an existing row, or none
/// for a row to be created (identities are storage-assigned, never chosen by
/// the client).
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredChild<T> {
    pub id: Option<i64>,
    pub fields: T,
}

/// The operations needed to converge storage to a desired child set
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan<T> {
    pub to_create: Vec<T>,
    pub to_update: Vec<(i64, T)>,
    pub to_delete: Vec<i64>,
}

impl<T> ReconcilePlan<T> {
    /// A plan that touches nothing (collection absent from the request)
    pub fn empty() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

impl<T> Default for ReconcilePlan<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Diff a desired child list against the identities currently persisted.
///
/// Every desired entry carrying an identity must reference an existing row:
/// an unknown identity is a not-found error, never a silent create, and a
/// duplicated identity is a validation error. Existing identities absent
/// from the desired list are deleted. An empty desired list deletes
/// everything — callers distinguish that from "collection untouched" before
/// calling (see `Patch`).
pub fn reconcile<T>(existing_ids: &[i64], desired: Vec<DesiredChild<T>>) -> Result<ReconcilePlan<T>> {
    let existing: HashSet<i64> = existing_ids.iter().copied().collect();
    let mut kept: HashSet<i64> = HashSet::new();

    let mut plan = ReconcilePlan::empty();

    for child in desired {
        match child.id {
            Some(id) => {
                if !existing.contains(&id) {
                    return Err(AppError::not_found(format!(
                        "Child {} does not belong to this invoice",
                        id
                    )));
                }
                if !kept.insert(id) {
                    return Err(AppError::validation(format!(
                        "Child {} appears more than once",
                        id
                    )));
                }
                plan.to_update.push((id, child.fields));
            }
            None => plan.to_create.push(child.fields),
        }
    }

    // Stable delete order: as persisted
    for id in existing_ids {
        if !kept.contains(id) {
            plan.to_delete.push(*id);
        }
    }

    Ok(plan)
}
