//! Contract types for inbound ledger requests
//!
//! This module contains the payloads that business workflows hand to the
//! ledger: domain events to post and manual compound entries.

pub mod ledger_event_v1;
pub mod manual_entry_v1;

pub use ledger_event_v1::*;
pub use manual_entry_v1::*;
