// drinv - Inventory text-format engine
//
// Reads and writes the bracketed "groups of hosts" inventory files consumed by
// the automation runner during disaster-recovery drills.

pub mod config;
pub mod inventory;
pub mod output;

pub use config::Config;
pub use inventory::{parse, serialize, Host, HostGroup, Inventory, ParseError, ParseOptions};
pub use output::DrinvError;

/// Version of the drinv tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::inventory::{
        parse, parse_with, serialize, Host, HostGroup, HostPattern, Inventory, ParseError,
        ParseOptions, Token, TokenKind,
    };
    pub use crate::output::DrinvError;
}
