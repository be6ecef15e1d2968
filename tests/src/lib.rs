//! # n2n-admin Test Suite
//!
//! Cross-component flows that the per-crate unit tests cannot cover on
//! their own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mgmt_udp.rs        # real loopback socket playing the supernode
//!     ├── node_listing.rs    # runtime wiring, unmapped edges, degraded sources
//!     ├── relay_flow.rs      # journal lines through the tailer to the listing
//!     └── login_throttle.rs  # lockouts and the key cap under flood
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p n2n-tests
//! cargo test -p n2n-tests integration::relay_flow
//!
//! # Benchmarks
//! cargo bench -p n2n-tests
//! ```

pub mod integration;
