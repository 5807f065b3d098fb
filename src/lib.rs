// Library root module for vault-router
// This file defines the public API and module structure: the router itself,
// the collaborator ports it calls out to and the in-memory sandbox behind them
//
// Numan Thabit 2025 Nov

pub mod address;
pub mod api;
pub mod config;
pub mod control;
pub mod errors;
pub mod metrics;
pub mod ports;
pub mod quant;
pub mod router;
pub mod sandbox;
pub mod state;
