pub mod config;
pub mod ticket;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, DatabaseConfig, ServerConfig,
};
pub use ticket::{
    DeleteSummary, NewTicket, SqliteTicketStore, StoreError, Ticket, TicketError, TicketPage,
    TicketPatch, TicketService, TicketStatus, TicketStore,
};
