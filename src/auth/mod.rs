// Authentication module
// Ticket acquisition, token exchange and renewal

mod exchange;
mod manager;
mod ticket;
mod types;

pub use exchange::TOKEN_PATH;
pub use manager::AuthManager;
pub use ticket::{CommandTicketProvider, StaticTicketProvider, TicketProvider};
pub use types::{AuthStatus, Credentials, TokenData};
