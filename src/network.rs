//! The simulated network: every participant, each owning its routing table.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::common::{Contact, Id, RoutingTable};
use crate::lookup::{LookupCoordinator, LookupOutcome};
use crate::{Error, Result};

/// One simulated participant: its [Contact] and its exclusively owned
/// routing table.
///
/// The table sits behind a [Mutex] so that the parallel queries of a
/// lookup round never observe a partially applied insert; each query locks
/// only the table of the participant it is addressed to.
#[derive(Debug)]
pub struct Participant {
    contact: Contact,
    table: Mutex<RoutingTable>,
}

impl Participant {
    /// Create a participant with an empty routing table.
    pub fn new(address: impl Into<String>) -> Participant {
        let contact = Contact::new(address);
        let table = Mutex::new(RoutingTable::new(*contact.id()));

        Participant { contact, table }
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn address(&self) -> &str {
        self.contact.address()
    }

    /// Owned copy of the routing table, for reporting.
    pub fn table_snapshot(&self) -> RoutingTable {
        self.table().clone()
    }

    pub fn table_size(&self) -> usize {
        self.table().size()
    }

    pub(crate) fn table(&self) -> MutexGuard<'_, RoutingTable> {
        // A poisoned lock can only mean a panicked query task; the table
        // itself is never left mid-update, so keep going.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Every simulated participant, keyed by address.
///
/// The population is fixed at construction; afterwards the only mutation
/// is routing-table growth, and the only write paths are the two steps of
/// a lookup (the responder learning of the querier, and the querier
/// absorbing the converged shortlist). Everything else is a read-only
/// view, so lookups run against `&Network`.
#[derive(Debug)]
pub struct Network {
    participants: HashMap<String, Participant>,
}

impl Network {
    /// Build a network from participant addresses, one participant per
    /// distinct address.
    ///
    /// Errors with [Error::EmptyPopulation] when no addresses are supplied.
    pub fn new<I, S>(addresses: I) -> Result<Network>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut participants = HashMap::new();

        for address in addresses {
            let address = address.into();
            participants
                .entry(address.clone())
                .or_insert_with(|| Participant::new(address));
        }

        if participants.is_empty() {
            return Err(Error::EmptyPopulation);
        }

        Ok(Network { participants })
    }

    // === Getters ===

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant(&self, address: &str) -> Option<&Participant> {
        self.participants.get(address)
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.participants.values()
    }

    pub fn contact(&self, address: &str) -> Option<&Contact> {
        self.participants.get(address).map(Participant::contact)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> + '_ {
        self.participants.keys().map(String::as_str)
    }

    // === Public Methods ===

    /// Run one iterative lookup from `querier` towards `target`, seeded
    /// with the querier's own contacts plus `bootstrap`.
    ///
    /// Errors with [Error::UnknownParticipant] when the querier address is
    /// not part of this network. Unknown *bootstrap* addresses are queried
    /// and answer with nothing, mirroring a stale list entry.
    pub fn run_lookup(
        &self,
        querier: &str,
        target: Id,
        bootstrap: &[String],
    ) -> Result<LookupOutcome> {
        let querier = self
            .contact(querier)
            .ok_or_else(|| Error::UnknownParticipant(querier.to_string()))?
            .clone();

        Ok(LookupCoordinator::new(self, querier, target, bootstrap).run())
    }

    // === Reporting views ===

    /// Owned snapshot of one participant's routing table.
    pub fn table_snapshot(&self, address: &str) -> Option<RoutingTable> {
        self.participants
            .get(address)
            .map(Participant::table_snapshot)
    }

    pub fn table_size(&self, address: &str) -> Option<usize> {
        self.participants.get(address).map(Participant::table_size)
    }

    /// Table sizes of the whole population, for network-health statistics.
    pub fn table_sizes(&self) -> Vec<(&str, usize)> {
        self.participants
            .iter()
            .map(|(address, participant)| (address.as_str(), participant.table_size()))
            .collect()
    }

    // === Visualization views ===

    /// Every non-empty bucket entry of one participant as a
    /// (from-address, to-address) pair.
    ///
    /// Contacts recorded in the table but absent from the network are
    /// skipped rather than aborting the report.
    pub fn bucket_edges(&self, address: &str) -> Vec<(String, String)> {
        let participant = match self.participants.get(address) {
            Some(participant) => participant,
            None => return Vec::new(),
        };

        let table = participant.table();
        table
            .contacts()
            .filter(|contact| self.participants.contains_key(contact.address()))
            .map(|contact| (address.to_string(), contact.address().to_string()))
            .collect()
    }

    /// Like [Self::bucket_edges], restricted to the participant's nearest
    /// non-empty bucket.
    pub fn nearest_bucket_edges(&self, address: &str) -> Vec<(String, String)> {
        let participant = match self.participants.get(address) {
            Some(participant) => participant,
            None => return Vec::new(),
        };

        let table = participant.table();
        match table.nearest_bucket() {
            Some((_, bucket)) => bucket
                .iter()
                .filter(|contact| self.participants.contains_key(contact.address()))
                .map(|contact| (address.to_string(), contact.address().to_string()))
                .collect(),
            None => Vec::new(),
        }
    }

    // === Crate-internal write paths ===

    pub(crate) fn lock_table(&self, address: &str) -> Option<MutexGuard<'_, RoutingTable>> {
        self.participants.get(address).map(Participant::table)
    }

    /// Deliver one simulated query: the responder learns of the querier,
    /// then answers with the K contacts of its own table closest to the
    /// target. An address outside the network answers with nothing.
    pub(crate) fn answer_query(
        &self,
        querier: &Contact,
        responder: &Contact,
        target: &Id,
    ) -> Vec<Contact> {
        let participant = match self.participants.get(responder.address()) {
            Some(participant) => participant,
            None => return Vec::new(),
        };

        let mut table = participant.table();
        table.add(querier.clone());

        table.closest(target)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_population_is_rejected() {
        let result = Network::new(Vec::<String>::new());

        assert_eq!(result.err(), Some(Error::EmptyPopulation));
    }

    #[test]
    fn duplicate_addresses_collapse() {
        let network = Network::new(["alpha", "alpha", "bravo"]).expect("non-empty");

        assert_eq!(network.len(), 2);
    }

    #[test]
    fn fresh_participants_have_empty_tables() {
        let network = Network::new(["alpha", "bravo"]).expect("non-empty");

        for participant in network.participants() {
            assert_eq!(participant.table_size(), 0);
        }
    }

    #[test]
    fn responder_learns_of_querier() {
        let network = Network::new(["alpha", "bravo"]).expect("non-empty");

        let querier = network.contact("alpha").expect("known").clone();
        let responder = network.contact("bravo").expect("known").clone();

        let response = network.answer_query(&querier, &responder, querier.id());

        assert_eq!(network.table_size("bravo"), Some(1));
        // Its only contact is now the querier itself.
        assert_eq!(response, vec![querier]);
    }

    #[test]
    fn unknown_responder_answers_with_nothing() {
        let network = Network::new(["alpha"]).expect("non-empty");

        let querier = network.contact("alpha").expect("known").clone();
        let stale = Contact::new("long gone");

        assert!(network.answer_query(&querier, &stale, querier.id()).is_empty());
    }

    #[test]
    fn reporting_views_skip_unknown_addresses() {
        let network = Network::new(["alpha"]).expect("non-empty");

        assert!(network.table_snapshot("ghost").is_none());
        assert!(network.bucket_edges("ghost").is_empty());
        assert!(network.nearest_bucket_edges("ghost").is_empty());
    }
}
