//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the in-memory master.  All tests run on the host with no real
//! hardware required.

mod blinds_tests;
mod mock_master;
mod registry_tests;
mod service_tests;
