//! Core library for the peer-evaluation service.
//!
//! Administrators define evaluation cycles (time window, agency scope,
//! criteria, rating bands); employees rate peers inside their own agency;
//! leaders track completion; a public board ranks the aggregate results.
//! Everything that computes — scoping, aggregation, classification,
//! completion — lives in [`reviews`] as pure functions over snapshots, with
//! storage abstracted behind small traits so the same logic serves the HTTP
//! service, the demo walkthrough, and the tests.

pub mod config;
pub mod error;
pub mod reviews;
pub mod roster;
pub mod telemetry;
