//! Integration Tests
//!
//! End-to-end tests of the analysis orchestrator against an in-memory
//! SQLite store, deterministic hashing embeddings, and a scripted LLM.

mod support;

// Full sessions: strategies, retries, persistence, failures
mod orchestrator_test;

// Cache tiers seen through the orchestrator
mod cache_test;

// Strategy boundaries and Map-Reduce call counts
mod strategy_test;

// JSON-lines ingestion feeding an analysis
mod ingest_test;
