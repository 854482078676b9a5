//! # dnsgrab
//!
//! Find hosts that expose a reachable DNS resolver on UDP port 53.
//!
//! Given hostnames or IP literals, dnsgrab resolves each hostname, probes
//! the resulting addresses on port 53 and reports the first one that
//! answers as `ip:53`. Useful during reconnaissance: start from a domain,
//! end up with an IP behind it that is itself a resolver.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! // One host, default config.
//! let finding = dnsgrab::single("example.com").await?;
//! if let Some(endpoint) = finding.endpoint() {
//!     println!("{endpoint}");
//! }
//!
//! // A batch, collected once everything is done.
//! for finding in dnsgrab::multiple(["example.com", "8.8.8.8"]).await? {
//!     println!("{finding}");
//! }
//! ```
//!
//! ## Streaming
//!
//! For long or incrementally arriving host lists, create a [`Runner`] and
//! drain its [`Findings`] while dispatching:
//!
//! ```rust,ignore
//! use dnsgrab::{Runner, RunnerConfig};
//!
//! let (mut runner, mut findings) = Runner::new(RunnerConfig::default().with_concurrency(50))?;
//! tokio::spawn(async move {
//!     while let Some(finding) = findings.next().await {
//!         if !finding.is_empty() {
//!             println!("{finding}");
//!         }
//!     }
//! });
//!
//! for line in lines {
//!     runner.dispatch([line]).await;
//! }
//! runner.finish().await;
//! ```
//!
//! ## Resolution order
//!
//! Hostnames are resolved by the system resolver first. If that fails, the
//! configured resolvers are tried one by one, in order; see
//! [`ResolverChain`].
//!
//! ## Caveat
//!
//! The liveness probe only checks that a UDP socket can be associated with
//! `ip:53`. It does not send a query, so it can report endpoints that never
//! answer.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod chain;
pub mod config;
pub mod error;
pub mod probe;
pub mod runner;
pub mod supply;
pub mod util;
pub mod worker;

pub use chain::{Connect, Resolve, ResolverChain};
pub use config::RunnerConfig;
pub use error::{Error, Result};
pub use probe::{Probe, UdpProbe};
pub use runner::{Findings, Runner, multiple, multiple_with, single, single_with};
pub use supply::{BuiltinResolvers, FileResolvers, ResolverSupply};
pub use worker::{Finding, Worker};
