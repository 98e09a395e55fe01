//! Application services layered over the ledger, report engine, and storage.

pub mod services;
