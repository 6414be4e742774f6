//! # Attest engine
//!
//! Session engine for a two-phase compliance self-assessment. A diagnosis
//! round runs the quantitative checklist first, hands its round number to
//! the qualitative survey and is then finalized server-side. Every edit
//! autosaves the full answer map to a draft store, so an interrupted
//! phase resumes exactly where it stopped.
//!
//! The backend and the draft store are injected ports
//! ([`attest_api::client::AssessmentApi`] and [`draft::DraftStore`]), so
//! sessions run identically against HTTP, SQLite or in-memory fakes.

pub mod catalog;
pub mod draft;
pub mod error;
pub mod response;
pub mod round;
pub mod session;
pub mod upload;
