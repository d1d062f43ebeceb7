//! # Kernel synchronization primitives

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod ticket_lock;

pub use ticket_lock::{TicketGuard, TicketLock};
