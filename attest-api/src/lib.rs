//! # Attest API SDK
//!
//! Typed client for the attest self-assessment backend.
//!
//! ## Example
//!
//! ```rust,no_run
//! use attest_api::http::HttpAssessmentApi;
//! use attest_api::client::AssessmentApi;
//! use attest_api::types::Phase;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = HttpAssessmentApi::new("http://localhost:3000")?;
//!     let questions = api.questions(Phase::Quantitative, 12).await?;
//!     println!("{} questions in the catalog", questions.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod types;
