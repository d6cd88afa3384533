// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! sqlbridge daemon.
//!
//! Owns the registry of open database handles and answers method calls
//! (`openDatabase`, `query`, `batch`, ...) from a host application. Every
//! call passes the storage permission gate before anything touches disk.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod marshal;
pub mod metrics;
pub mod operations;
pub mod permission;
pub mod registry;
pub mod server;

#[cfg(test)]
mod tests;
