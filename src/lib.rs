//! Morning routine checklist for the terminal. Tasks are checked off every morning, completing
//! all of them extends a daily streak, and a small daemon reminds you at 07:30.
//!

pub mod checklist;
pub mod cli;
pub mod daemon;
pub mod notification;
pub mod store;
pub mod utils;
