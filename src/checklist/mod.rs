//! The checklist itself. [manager::Checklist] owns the state for one app load and mirrors every
//! mutation into a [KeyValueStore](crate::store::KeyValueStore).

pub mod entities;
pub mod manager;
