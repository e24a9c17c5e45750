mod af_file;
pub use af_file::{read_document, read_netlist, write_document, Error};

/// SPICE netlist scanning.
pub mod netlist;
pub use netlist::extract_identifiers;
