//! External delivery channels for promotion notifications.

pub mod webhook;
