//! Otech assistant server library.
//!
//! Turns a chat history plus an optional CSV attachment into a single
//! Gemini prompt and returns one reply per request.

pub mod api;
pub mod chat;
pub mod config;
pub mod csv_data;
pub mod gemini;
pub mod prompt;
