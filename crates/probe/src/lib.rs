//! # Probe
//!
//! Concurrent, failure-tolerant inventory of the host's external tools.
//!
//! ## Core Concepts
//!
//! - **Shell**: the boundary to external programs (PATH lookup + bounded-wait execution)
//! - **Probe**: one command whose output is parsed into a value, or nothing
//! - **Aggregation**: fan-out of many probes with fan-in in submission order
//! - **Counter**: nested profile × region fan-out over a paginated API
//!
//! ## Example
//!
//! ```ignore
//! use probe::{Invocation, Probe, SystemShell, parse, run_all};
//! use std::sync::Arc;
//!
//! let probes = vec![
//!     Probe::new("brew", Invocation::new("brew", ["list", "-1"]), parse::line_count),
//!     Probe::new("apt", Invocation::new("apt-mark", ["showmanual"]), parse::line_count),
//! ];
//!
//! let handle = run_all(probes, Arc::new(SystemShell::default()));
//! for result in handle.collect() {
//!     if let Some(count) = result.value {
//!         println!("{}: {count}", result.name);
//!     }
//! }
//! ```
//!
//! A probe never fails its caller. Missing tools, non-zero exits,
//! timeouts and unparsable output all come back as a result with no
//! value; [`ProbeStatus`] keeps the reason for callers that care.

pub mod aggregate;
pub mod counter;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod probe;
pub mod shell;

pub use aggregate::{Aggregation, Tally, run_all};
pub use counter::{
    Page, PageSource, RegionReport, ResourceCount, Scope, UNKNOWN_TYPE, count_resources,
    count_scope, populated, resource_type,
};
pub use error::{Error, Result};
pub use probe::{Parser, Probe, ProbeResult, ProbeStatus, parse};
pub use shell::{CommandOutput, DEFAULT_TIMEOUT, Invocation, Shell, SystemShell};
pub use which::which;
