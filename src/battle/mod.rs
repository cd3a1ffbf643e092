pub mod action_queue;
pub mod commands;
pub mod conditions;
pub mod engine;
pub mod history;
pub mod instruct;
pub mod phases;
pub mod position;
pub mod presentation;
pub mod scheduler;
pub mod state;
pub mod status;
pub mod targeting;

#[cfg(test)]
mod tests;
