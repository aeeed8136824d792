//! # Tally Application
//!
//! Wiring between the store and the terminal.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  main.rs      - CLI parsing, logging, config loading            │
//! │    │                                                            │
//! │    ├── commands/  - init, board, demo                           │
//! │    ├── seed       - Initial data written through the store      │
//! │    └── render     - Board text from a StoreSnapshot             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod render;
pub mod seed;
