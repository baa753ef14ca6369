//! Contact entry in a routing table: an address and its derived [Id].
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::common::Id;

/// A dialable participant reference: an opaque address string paired with
/// the [Id] derived from it.
///
/// Contacts are cheap to clone and compare equal by address alone.
#[derive(Clone)]
pub struct Contact(Arc<ContactInner>);

struct ContactInner {
    address: String,
    id: Id,
}

impl Contact {
    pub fn new(address: impl Into<String>) -> Contact {
        let address = address.into();
        let id = Id::from_address(&address);

        Contact(Arc::new(ContactInner { address, id }))
    }

    pub fn address(&self) -> &str {
        &self.0.address
    }

    pub fn id(&self) -> &Id {
        &self.0.id
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.0.address == other.0.address
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.address.hash(state);
    }
}

impl Debug for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Contact({}, {:?})", self.0.address, self.0.id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn id_is_derived_from_address() {
        let contact = Contact::new("alpha");

        assert_eq!(*contact.id(), Id::from_address("alpha"));
    }

    #[test]
    fn equality_is_by_address() {
        let a = Contact::new("alpha");
        let b = Contact::new("alpha");
        let c = Contact::new("bravo");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
