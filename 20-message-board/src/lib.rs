//! A small message board whose HTTP front end never touches its own storage.
//!
//! Form submissions are relayed as single UDP datagrams to a background
//! listener, which is the only task that ever writes the JSON store. The
//! HTTP response (a redirect) goes out before the write happens.
//!
//! - [`cli`] and [`config`] turn flags and env vars into a [`config::BoardConfig`].
//! - [`entry`] and [`frame`] define the stored record and the relay wire format.
//! - [`store`] reads and rewrites the JSON file on every upsert.
//! - [`relay`] holds the fire-and-forget sender and the listener loop.
//! - [`assets`] and [`http`] serve pages and accept submissions.
//! - [`board`] binds both sockets and supervises the two tasks.

pub mod assets;
pub mod board;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod http;
pub mod relay;
pub mod store;
