//! # formbridge
//!
//! A bridge between a parent process and a form validation engine.
//!
//! The parent writes JSON requests to stdin, each followed by a terminator
//! (by default `0x04`), and reads replies framed the same way from stdout.
//! Errors come back framed on stderr.
//!
//! Requests name one of three operations:
//!
//! - `cleanup` strips submitted data the form does not declare
//! - `validate` cleans the data, then runs it through the configured engine
//! - `ping` answers with the configured message; so does anything unknown
//!
//! ## Modules
//!
//! - [`command`] - Request parsing, dispatch and the serve loop
//! - [`config`] - The `.formbridge.toml` configuration
//! - [`ctx`] - Application context shared by all commands
//! - [`plugins`] - Custom component discovery
//! - [`validate`] - The validation engine seam
//!
//! ## Example
//!
//! ```rust
//! use std::{io::Cursor, path::Path};
//!
//! use eot_frame::{FrameReader, FrameWriter};
//! use formbridge::{command::serve, config::BridgeConfig, ctx::AppContext};
//!
//! let ctx = AppContext::new(BridgeConfig::default(), Path::new("."));
//! let input = br#"{"operation":"cleanup","form":{"components":[{"key":"a","input":true}]},"data":{"a":1,"b":2}}"#;
//! let mut reader = FrameReader::new(Cursor::new([&input[..], &b"\x04"[..]].concat()));
//! let mut writer = FrameWriter::new(Vec::new(), Vec::new());
//!
//! assert_eq!(serve(&ctx, &mut reader, &mut writer).unwrap(), 1);
//! let (out, _) = writer.into_inner();
//! assert_eq!(out, b"{\"a\":1}\x04");
//! ```

#[macro_use]
extern crate log;

pub mod command;
pub mod config;
pub mod ctx;
pub mod error;
pub mod plugins;
pub mod utils;
pub mod validate;

pub use error::{BridgeError, BridgeResult};
