//! Applicant intake: a PDF upload gateway, a registration gateway, and the
//! submission form that calls them in sequence.

pub mod config;
pub mod error;
pub mod form;
pub mod gateways;
pub mod telemetry;
