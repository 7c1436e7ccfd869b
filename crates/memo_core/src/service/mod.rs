//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate guarded repository calls into use-case level APIs.

pub mod memo_service;
