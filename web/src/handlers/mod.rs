//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod categories;
pub mod eligibility;
pub mod health;
pub mod pull_couple;
pub mod tickets;
