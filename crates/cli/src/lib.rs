//! Library half of the `leadgen` binary: the state controller shared by the
//! interactive app and the one-shot commands.

pub mod controller;

pub use controller::{Batch, Controller, LeadForm, OpState, Operation, Ticket, VerifyJob, ViewMode};
