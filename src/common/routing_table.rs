//! XOR-distance bucketed routing table, one per participant.

use std::collections::BTreeMap;
use std::slice::Iter;

use crate::common::{Contact, Id};
use crate::lookup::ClosestContacts;

/// K = the maximum size of a bucket, and the maximum size of a closest-set
/// query result.
pub const MAX_BUCKET_SIZE_K: usize = 8;

/// Routing table of a single participant: buckets keyed by the length of
/// the identifier prefix shared with the owner (0..=255).
///
/// Owned exclusively by that participant; the only write path is [add],
/// which is total and idempotent.
///
/// [add]: RoutingTable::add
#[derive(Debug, Clone)]
pub struct RoutingTable {
    id: Id,
    buckets: BTreeMap<u8, KBucket>,
}

impl RoutingTable {
    /// Create a new empty [RoutingTable] owned by the given id.
    pub fn new(id: Id) -> Self {
        RoutingTable {
            id,
            buckets: BTreeMap::new(),
        }
    }

    /// Returns the [Id] of the owning participant, where the shared prefix
    /// is measured from.
    pub fn id(&self) -> &Id {
        &self.id
    }

    // === Public Methods ===

    /// Attempts to add a contact to this routing table, and returns `true`
    /// if it did.
    ///
    /// A no-op when the contact is the owner itself, when the address is
    /// already present in its bucket, or when the bucket is full
    /// (reject-new policy: a full bucket never evicts).
    pub fn add(&mut self, contact: Contact) -> bool {
        let index = match self.id.bucket_index(contact.id()) {
            Some(index) => index,
            // Do not add self to the routing table.
            None => return false,
        };

        self.buckets.entry(index).or_default().add(contact)
    }

    /// Iterate over every contact in every bucket. No ordering guarantee
    /// beyond bucket index then insertion order.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.buckets.values().flat_map(|bucket| bucket.iter())
    }

    /// Return up to K contacts from this table, closest to the target.
    pub fn closest(&self, target: &Id) -> Vec<Contact> {
        let mut closest = ClosestContacts::new(*target);

        for contact in self.contacts() {
            closest.add(contact.clone());
        }

        closest.k_closest()
    }

    /// Read-only view of the non-empty buckets, for reporting.
    pub fn buckets(&self) -> impl Iterator<Item = (u8, &KBucket)> + '_ {
        self.buckets.iter().map(|(index, bucket)| (*index, bucket))
    }

    /// The non-empty bucket with the longest shared prefix, holding this
    /// participant's nearest known contacts.
    pub fn nearest_bucket(&self) -> Option<(u8, &KBucket)> {
        self.buckets
            .iter()
            .next_back()
            .map(|(index, bucket)| (*index, bucket))
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|bucket| bucket.is_empty())
    }

    /// Return the number of contacts in this routing table.
    pub fn size(&self) -> usize {
        self.buckets
            .values()
            .fold(0, |acc, bucket| acc + bucket.len())
    }

    // === Private Methods ===

    #[cfg(test)]
    fn contains(&self, address: &str) -> bool {
        self.contacts().any(|contact| contact.address() == address)
    }
}

/// An ordered set of at most K distinct contacts sharing the same prefix
/// length with the table owner. Insertion order is preserved; a full
/// bucket rejects new contacts instead of evicting old ones.
#[derive(Debug, Clone)]
pub struct KBucket {
    contacts: Vec<Contact>,
}

impl KBucket {
    pub fn new() -> Self {
        KBucket {
            contacts: Vec::with_capacity(MAX_BUCKET_SIZE_K),
        }
    }

    // === Public Methods ===

    pub fn add(&mut self, incoming: Contact) -> bool {
        if self.contains(incoming.address()) {
            return false;
        }

        if self.contacts.len() >= MAX_BUCKET_SIZE_K {
            return false;
        }

        self.contacts.push(incoming);
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.contacts
            .iter()
            .any(|contact| contact.address() == address)
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn iter(&self) -> Iter<'_, Contact> {
        self.contacts.iter()
    }
}

impl Default for KBucket {
    fn default() -> Self {
        Self::new()
    }
}
