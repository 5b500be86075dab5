//! Data types exchanged between handlers and the object store.
//!
//! Nothing here is persisted by the gateway; the store is the sole source of
//! truth for object existence and content.

pub mod download;
pub mod object;
pub mod responses;
