//! Command dispatch for the framed stdio loop.
//!
//! Every inbound frame is a JSON object naming an `operation` together with
//! the `form` definition and the submitted `data`. Replies go to the output
//! sink, failures to the error sink, each as one frame.

use std::io::{Read, Write};

use eot_frame::{FrameReader, FrameWriter};
use formprune::{clean_submission_with, unwrap_grid_data_with};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    ctx::AppContext,
    error::{BridgeError, BridgeResult},
};

/// What a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Cleanup,
    Validate,
    Ping,
}

impl Operation {
    /// Parses an operation tag, ignoring case. Anything unknown is a ping.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("cleanup") => Self::Cleanup,
            Some("validate") => Self::Validate,
            Some("ping") => Self::Ping,
            other => {
                if let Some(other) = other {
                    debug!("unknown operation {other:?}, treated as ping");
                }
                Self::Ping
            }
        }
    }
}

/// An inbound message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Request {
    pub operation: Option<Value>,
    pub form: Value,
    pub data: Value,
}

impl Request {
    /// Parses a frame. Only JSON objects are requests.
    pub fn parse(frame: &[u8]) -> BridgeResult<Self> {
        let value: Value = serde_json::from_slice(frame).map_err(BridgeError::malformed)?;
        if !value.is_object() {
            return Err(BridgeError::malformed(format!(
                "expected a JSON object, got {}",
                formprune::value::kind_name(&value)
            )));
        }
        serde_json::from_value(value).map_err(BridgeError::malformed)
    }

    /// The requested operation. A tag that is not a string is a ping.
    pub fn operation(&self) -> Operation {
        match &self.operation {
            Some(Value::String(tag)) => Operation::from_tag(Some(tag)),
            Some(other) => {
                debug!("operation tag {other} is not a string, treated as ping");
                Operation::Ping
            }
            None => Operation::from_tag(None),
        }
    }
}

/// Where a reply goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A frame on the output sink.
    Out(String),
    /// A frame on the error sink.
    Err(String),
}

impl From<BridgeResult<String>> for Reply {
    fn from(res: BridgeResult<String>) -> Self {
        match res {
            Ok(body) => Reply::Out(body),
            Err(e) => {
                debug!("error reply: {e}");
                Reply::Err(e.to_string())
            }
        }
    }
}

/// Strips undeclared data from the request's submission.
pub fn cleanup(ctx: &AppContext, request: &Request) -> Value {
    let submission = json!({ "data": request.data });
    let mut cleaned = clean_submission_with(&ctx.builder, &request.form, &submission);
    cleaned
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null)
}

/// Cleans the request's submission and hands it to the validation engine.
///
/// Rows of `noRowWrapping` grids in the engine's `data` come back unwrapped.
///
/// # Errors
///
/// Whatever the engine reports.
pub fn validate(ctx: &AppContext, request: &Request) -> BridgeResult<Value> {
    let submission = json!({ "data": cleanup(ctx, request) });
    let components = ctx.components();
    let mut result = ctx
        .validator()
        .validate(&request.form, &submission, &components)?;
    if let Some(data) = result.get_mut("data") {
        *data = unwrap_grid_data_with(&ctx.builder, data, &request.form);
    }
    Ok(result)
}

/// Handles one frame.
pub fn handle(ctx: &AppContext, frame: &[u8]) -> Reply {
    let reply = Request::parse(frame).and_then(|request| {
        let operation = request.operation();
        debug!("operation {operation:?}");
        match operation {
            Operation::Cleanup => to_json(&cleanup(ctx, &request)),
            Operation::Validate => validate(ctx, &request).and_then(|v| to_json(&v)),
            Operation::Ping => Ok(ctx.config.ping_message.clone()),
        }
    });
    reply.into()
}

fn to_json(value: &Value) -> BridgeResult<String> {
    serde_json::to_string(value).map_err(BridgeError::malformed)
}

/// Serves frames from `reader` until it is exhausted.
///
/// Returns the number of frames handled.
///
/// # Errors
///
/// Only I/O failures on the streams end the loop early.
pub fn serve<R, O, E>(
    ctx: &AppContext,
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<O, E>,
) -> BridgeResult<usize>
where
    R: Read,
    O: Write,
    E: Write,
{
    let mut handled = 0;
    while let Some(frame) = reader.read_frame()? {
        if frame.is_empty() {
            continue;
        }
        match handle(ctx, &frame) {
            Reply::Out(body) => writer.send(body.as_bytes())?,
            Reply::Err(body) => writer.send_error(body.as_bytes())?,
        }
        handled += 1;
    }
    info!("input closed after {handled} messages");
    Ok(handled)
}
