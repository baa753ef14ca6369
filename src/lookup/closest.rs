//! The single source of truth for "closeness" to a target.

use std::collections::HashSet;

use crate::common::{Contact, Id, MAX_BUCKET_SIZE_K};

/// Collects candidate contacts and selects the K closest to a target.
///
/// Candidates are deduplicated by address, keeping the first occurrence,
/// and the final ordering is a stable sort by XOR distance: candidates at
/// equal distance retain their relative input order.
///
/// Every closeness decision in the crate (routing table queries, shortlist
/// trimming, simulated responses) goes through this selector, so that
/// lookups converge consistently.
#[derive(Debug, Clone)]
pub struct ClosestContacts {
    target: Id,
    contacts: Vec<Contact>,
    seen: HashSet<Contact>,
}

impl ClosestContacts {
    pub fn new(target: Id) -> Self {
        Self {
            target,
            contacts: Vec::with_capacity(MAX_BUCKET_SIZE_K * 2),
            seen: HashSet::new(),
        }
    }

    // === Getters ===

    pub fn target(&self) -> &Id {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    // === Public Methods ===

    /// Add a candidate, ignoring addresses already seen.
    pub fn add(&mut self, contact: Contact) {
        if self.seen.insert(contact.clone()) {
            self.contacts.push(contact);
        }
    }

    /// The `min(K, candidates)` closest candidates, closest first.
    pub fn k_closest(&self) -> Vec<Contact> {
        let mut sorted = self.contacts.clone();

        sorted.sort_by_key(|contact| contact.id().xor(&self.target));
        sorted.truncate(MAX_BUCKET_SIZE_K);

        sorted
    }
}

impl Extend<Contact> for ClosestContacts {
    fn extend<T: IntoIterator<Item = Contact>>(&mut self, iter: T) {
        for contact in iter {
            self.add(contact);
        }
    }
}
