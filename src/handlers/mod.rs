mod admin;
mod states;
mod visitor;

pub use states::{schema, AppFunnel, HandlerError};
