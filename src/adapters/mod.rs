//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements  | Connects to                      |
//! |--------------|-------------|----------------------------------|
//! | `inbox`      | PinLink     | Per-owner mailbox of the service |
//! | `log_sink`   | PinLink     | `log` facade (wraps another link)|
//! | `sim_master` | MasterLink  | In-memory master device          |
//! | `time`       | Clock       | `Instant` / virtual time         |

pub mod inbox;
pub mod log_sink;
pub mod sim_master;
pub mod time;
