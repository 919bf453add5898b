mod entry;

pub use entry::{IndexEntry, InvalidEntry};
