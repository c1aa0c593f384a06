// File: src/repositories/postgres/mod.rs

pub mod account;
pub mod contact;
pub mod message;
pub mod queue;
pub mod ticket;

pub use account::PostgresAccountRepository;
pub use contact::PostgresContactRepository;
pub use message::PostgresMessageRepository;
pub use queue::PostgresQueueRepository;
pub use ticket::PostgresTicketRepository;
