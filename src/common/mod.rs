mod contact;
mod id;
mod routing_table;

pub use contact::*;
pub use id::*;
pub use routing_table::*;
