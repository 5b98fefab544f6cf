pub mod item;

pub use item::{ParseEnumError, Person, Priority, Status, UNASSIGNED, WorkItem};
