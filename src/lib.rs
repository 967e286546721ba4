//! Purpose: In-memory columnar tables with dtype inference and copy-on-write transforms.
//! Exports: `api` (public surface), `core` (storage and engines), `expr`, `ingest`.
//! Role: Library backing the `colframe` CLI and embedding callers.
//! Invariants: Published tables and stores are immutable; transforms always return new values.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod expr;
pub mod ingest;
