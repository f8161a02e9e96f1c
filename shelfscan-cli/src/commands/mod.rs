//! Command handlers -- one module per subcommand

pub mod config;
pub mod lookup;
pub mod scan;
