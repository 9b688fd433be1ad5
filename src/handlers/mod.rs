// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth)      → /, /health, /api/auth/*
// Protected (JWT auth)  → every other /api route
//
// Handlers stay thin: extract, call one service, map to a DTO.

pub mod health;
pub mod protected;
pub mod public;

pub use health::{health, root};
