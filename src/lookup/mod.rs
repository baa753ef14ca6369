//! Iterative lookup: rounds of bounded-concurrency queries converging on
//! the K closest contacts to a target.

mod closest;

use std::collections::{HashMap, HashSet};
use std::thread;

use tracing::{debug, trace};

use crate::common::{Contact, Id};
use crate::network::Network;

pub use closest::ClosestContacts;

/// ALPHA = the maximum number of outstanding queries per lookup round.
pub const ALPHA: usize = 3;

/// One simulated query sent during a lookup, for diagnostics and
/// visualization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEdge {
    pub from: Contact,
    pub to: Contact,
}

/// The converged result of one lookup invocation.
#[derive(Debug)]
pub struct LookupOutcome {
    contacts: Vec<Contact>,
    edges: Vec<QueryEdge>,
}

impl LookupOutcome {
    /// The up-to-K closest contacts found, closest first.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// The result addresses, closest first.
    pub fn addresses(&self) -> impl Iterator<Item = &str> + '_ {
        self.contacts.iter().map(|contact| contact.address())
    }

    /// Every (querier, queried contact) edge traversed, in dispatch order.
    pub fn edges(&self) -> &[QueryEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

struct ShortlistEntry {
    contact: Contact,
    queried: bool,
}

/// Drives one lookup for one querier against one target.
///
/// Rounds pick the up-to-ALPHA closest unqueried shortlist entries and
/// dispatch them as parallel tasks; the join at the end of each round is a
/// hard barrier, and discoveries are merged at that single point before the
/// shortlist is re-trimmed to the K closest. The lookup converges when
/// every surviving shortlist entry has been queried.
pub(crate) struct LookupCoordinator<'a> {
    network: &'a Network,
    querier: Contact,
    target: Id,
    shortlist: Vec<ShortlistEntry>,
    /// Every address queried during this lookup, across all rounds.
    queried: HashSet<Contact>,
    edges: Vec<QueryEdge>,
    round: usize,
}

impl<'a> LookupCoordinator<'a> {
    pub(crate) fn new(
        network: &'a Network,
        querier: Contact,
        target: Id,
        bootstrap: &[String],
    ) -> Self {
        let mut pool = ClosestContacts::new(target);

        if let Some(table) = network.lock_table(querier.address()) {
            pool.extend(table.contacts().cloned());
        }
        pool.extend(bootstrap.iter().map(|address| Contact::new(address.as_str())));

        let shortlist = pool
            .k_closest()
            .into_iter()
            .map(|contact| ShortlistEntry {
                contact,
                queried: false,
            })
            .collect();

        trace!(querier = querier.address(), ?target, "New lookup");

        Self {
            network,
            querier,
            target,
            shortlist,
            queried: HashSet::new(),
            edges: Vec::new(),
            round: 0,
        }
    }

    pub(crate) fn run(mut self) -> LookupOutcome {
        while self.round() {}

        self.converge()
    }

    // === Private Methods ===

    /// Run one lookup round. Returns `false` once converged.
    fn round(&mut self) -> bool {
        let selected: Vec<Contact> = self
            .shortlist
            .iter()
            .filter(|entry| !entry.queried)
            .take(ALPHA)
            .map(|entry| entry.contact.clone())
            .collect();

        if selected.is_empty() {
            return false;
        }

        self.round += 1;

        for contact in &selected {
            if let Some(entry) = self
                .shortlist
                .iter_mut()
                .find(|entry| entry.contact == *contact)
            {
                entry.queried = true;
            }
            self.queried.insert(contact.clone());
            self.edges.push(QueryEdge {
                from: self.querier.clone(),
                to: contact.clone(),
            });

            trace!(
                querier = self.querier.address(),
                queried = contact.address(),
                round = self.round,
                "Visiting contact"
            );
        }

        // Task per query; the selected responders are distinct, so each
        // task locks a different participant's table. The join is the
        // round barrier.
        let network = self.network;
        let querier = &self.querier;
        let target = &self.target;

        let responses: Vec<Vec<Contact>> = thread::scope(|scope| {
            let handles: Vec<_> = selected
                .iter()
                .map(|responder| scope.spawn(move || network.answer_query(querier, responder, target)))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().expect("lookup query task panicked"))
                .collect()
        });

        // Single synchronized merge point: append discoveries in dispatch
        // order, then trim back to the K closest.
        for returned in responses {
            for contact in returned {
                if self.shortlist.iter().any(|entry| entry.contact == contact) {
                    continue;
                }
                self.shortlist.push(ShortlistEntry {
                    contact,
                    queried: false,
                });
            }
        }

        self.trim_shortlist();

        self.shortlist.iter().any(|entry| !entry.queried)
    }

    /// Recompute the shortlist as the K closest of its current entries,
    /// carrying each survivor's queried flag. An address missing from the
    /// previous shortlist falls back to the ever-queried set, which can
    /// mark a fresh discovery as queried if the same address was already
    /// contacted via another path this lookup.
    fn trim_shortlist(&mut self) {
        let mut selector = ClosestContacts::new(self.target);
        for entry in &self.shortlist {
            selector.add(entry.contact.clone());
        }

        let prior: HashMap<Contact, bool> = self
            .shortlist
            .drain(..)
            .map(|entry| (entry.contact, entry.queried))
            .collect();
        let ever_queried = &self.queried;

        self.shortlist = selector
            .k_closest()
            .into_iter()
            .map(|contact| {
                let queried = prior
                    .get(&contact)
                    .copied()
                    .unwrap_or_else(|| ever_queried.contains(&contact));
                ShortlistEntry { contact, queried }
            })
            .collect();
    }

    /// The querier absorbs the converged shortlist into its own table and
    /// the outcome is returned, closest first.
    fn converge(self) -> LookupOutcome {
        let contacts: Vec<Contact> = self
            .shortlist
            .iter()
            .map(|entry| entry.contact.clone())
            .collect();

        if let Some(mut table) = self.network.lock_table(self.querier.address()) {
            for contact in &contacts {
                table.add(contact.clone());
            }
        }

        debug!(
            querier = self.querier.address(),
            target = ?self.target,
            results = contacts.len(),
            visited = self.queried.len(),
            rounds = self.round,
            "Done lookup"
        );

        LookupOutcome {
            contacts,
            edges: self.edges,
        }
    }
}
