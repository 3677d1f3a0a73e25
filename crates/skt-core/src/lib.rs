//! # skt-core
//!
//! Core types, ID prefixes, validation, and error types for SkillTrack.
//!
//! This crate provides the foundational types shared across all SkillTrack crates:
//! - Entity structs for all domain objects (programmes, beneficiaries, bundles, etc.)
//! - Status and type enums with their wire names
//! - ID prefix constants
//! - Request payloads with validation rules
//! - Pure impact-dashboard math (windows, medians, KPI percentages)
//! - API response shapes
//! - Audit `meta` payload types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod impact;
pub mod responses;
pub mod validation;
