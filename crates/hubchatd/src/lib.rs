//! hubchat daemon - hub actor, client sessions and TCP server
//!
//! - `hub` - Actor owning the handle and channel registries
//! - `server` - TCP listener and per-connection sessions
//! - `sink` - Shared, timeout-bounded writer for one client
//! - `config` - TOML configuration with defaults
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        hubchatd                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │   ChatServer    │     │         HubActor            │   │
//! │  │  (TcpListener)  │     │ (handles, channels, sinks)  │   │
//! │  └────────┬────────┘     └──────────────▲──────────────┘   │
//! │           │ accept                      │ HubEvent          │
//! │           ▼                             │ (mpsc)            │
//! │  ┌─────────────────┐                    │                   │
//! │  │     Session     │────────────────────┘                   │
//! │  │  (per client)   │                                        │
//! │  └─────────────────┘                                        │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod hub;
pub mod server;
pub mod sink;
