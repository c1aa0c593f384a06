// File: chatdesk-common/src/models/mod.rs
pub mod account;
pub mod contact;
pub mod envelope;
pub mod job;
pub mod message;
pub mod queue;
pub mod ticket;

pub use account::{Account, AccountStatus};
pub use contact::Contact;
pub use envelope::MessageEnvelope;
pub use job::{Backoff, JobOptions, JobPayload, ReplyJob};
pub use message::{MediaKind, Message};
pub use queue::Queue;
pub use ticket::{Ticket, TicketStatus};
