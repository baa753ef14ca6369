#![doc = include_str!("../README.md")]

mod common;
mod error;
mod lookup;
mod network;
mod simulation;

pub use crate::common::{
    Contact, Distance, Id, KBucket, RoutingTable, ID_BITS, ID_SIZE, MAX_BUCKET_SIZE_K,
};
pub use crate::error::{Error, Result};
pub use crate::lookup::{ClosestContacts, LookupOutcome, QueryEdge, ALPHA};
pub use crate::network::{Network, Participant};
pub use crate::simulation::{parse_address_list, Simulation, SimulationConfig};
