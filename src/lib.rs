//! # docket
//!
//! Ingests plain-text reports from a directory, stores their metadata in
//! SQLite, indexes their full text in a search backend, and serves them over
//! a JSON HTTP API with per-report tagging.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  documents  │──▶│ Reconciler  │──▶│    SQLite    │
//! │  directory  │   │ parse+store │   │ report / tag │
//! └─────────────┘   └──────┬──────┘   └──────┬───────┘
//!                          ▼                 │
//!                   ┌─────────────┐          │
//!                   │ SearchIndex │◀───┐     │
//!                   └─────────────┘    │     ▼
//!                                   ┌──────────────┐
//!                                   │  HTTP (axum) │
//!                                   │ + tag diffs  │
//!                                   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docket init                 # create database
//! docket ingest               # reconcile the documents directory once
//! docket search "pneumonia"   # ranked hits from the search index
//! docket serve                # ingest, then serve the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error kinds |
//! | [`models`] | Core data types |
//! | [`parser`] | Title / author / synopsis extraction |
//! | [`ingest`] | Startup reconciliation |
//! | [`repository`] | Report and tag persistence |
//! | [`index`] | Search index backends |
//! | [`tags`] | Tag diff engine |
//! | [`search`] | Listing and search |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod config;
pub mod db;
pub mod error;
pub mod get;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod parser;
pub mod repository;
pub mod search;
pub mod server;
pub mod tags;
