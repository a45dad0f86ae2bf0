//! # Heredi
//!
//! `heredi` is a small REST service for tracking family genetic and health
//! records. Accounts come in two kinds sharing one email namespace:
//! pacientes (patients, who may hold clinical metadata and a family
//! membership) and profissionais de saúde (health professionals, identity
//! only).
//!
//! ## Sessions
//!
//! Authentication is stateless: registration and login issue an HS256
//! signed bearer token with a 24 hour expiry, verified locally on every
//! guarded request. No session state is kept server-side.
//!
//! ## Families
//!
//! A paciente belongs to at most one família at a time. Creating a família
//! and adding members are transactional: a família row is never observable
//! without its creator's membership, and a partially-added member is never
//! observable at all. Leaving a família never deletes it, even when it
//! becomes memberless.

pub mod api;
pub mod cli;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
