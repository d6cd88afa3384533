// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! sqlbridge wire protocol.
//!
//! This crate defines the values and envelopes exchanged between a host
//! application and the sqlbridge daemon: a method name plus an argument map
//! going in, and a success value, a structured error or "not implemented"
//! coming back.
//!
//! **Architecture**: This is the Protocol Layer. It knows nothing about
//! SQLite; the daemon converts between [`Value`] and database scalars.
//!
//! # Wire format
//!
//! Every message is one JSON document. [`Value`] is adjacently tagged so
//! that byte blobs, integers and reals survive the trip unambiguously:
//!
//! ```text
//! {"method":"query","arguments":{"type":"map","value":{
//!     "id":{"type":"int","value":1},
//!     "sql":{"type":"text","value":"SELECT * FROM t"}}}}
//! ```

mod arguments;
mod error;
mod message;
pub mod names;
mod value;

pub use arguments::Arguments;
pub use error::{ProtocolError, Result};
pub use message::{Method, MethodCall, MethodError, MethodResponse};
pub use value::{Map, Value};
