// Messaging module - Lock-free command queue to the audio thread

pub mod channels;
pub mod command;
