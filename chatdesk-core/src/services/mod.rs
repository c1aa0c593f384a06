// File: src/services/mod.rs

pub mod ticket_service;

pub use ticket_service::TicketService;
