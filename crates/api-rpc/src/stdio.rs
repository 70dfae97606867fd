//! Single-shot stdio transport
//!
//! One JSON-RPC message in, at most one message out. Lets a parent process
//! drive the runner through pipes without a TCP listener.
//!
//! The message may be a single call, a notification (no `id`, executed but
//! never answered) or a batch. A missing `"jsonrpc"` member is read as 2.0
//! so that older callers that only send `method`/`params`/`id` keep working.

use jsonrpsee::RpcModule;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// JSON-RPC 2.0 "Parse error"
pub const PARSE_ERROR_CODE: i32 = -32700;

/// JSON-RPC 2.0 "Invalid Request"
pub const INVALID_REQUEST_CODE: i32 = -32600;

/// Dispatch one raw JSON-RPC message through `module`
///
/// Returns the text to write back, or `None` when the message held only
/// notifications. Bad input yields a standard error response rather than
/// an error, so the caller always has something to write back.
pub async fn dispatch(module: &RpcModule<()>, input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        warn!("Empty request on stdin");
        return Some(error_response(PARSE_ERROR_CODE, "Parse error", Value::Null).to_string());
    }

    let message: Value = match serde_json::from_str(input) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Malformed request on stdin");
            return Some(error_response(PARSE_ERROR_CODE, "Parse error", Value::Null).to_string());
        }
    };

    match message {
        Value::Array(calls) => dispatch_batch(module, calls).await,
        call => dispatch_call(module, call).await.map(|reply| reply.to_string()),
    }
}

async fn dispatch_batch(module: &RpcModule<()>, calls: Vec<Value>) -> Option<String> {
    if calls.is_empty() {
        warn!("Empty batch on stdin");
        return Some(invalid_request(Value::Null).to_string());
    }

    let mut replies = Vec::with_capacity(calls.len());
    for call in calls {
        if let Some(reply) = dispatch_call(module, call).await {
            replies.push(reply);
        }
    }

    if replies.is_empty() {
        None
    } else {
        Some(Value::Array(replies).to_string())
    }
}

/// Run one call; `None` for a notification
async fn dispatch_call(module: &RpcModule<()>, call: Value) -> Option<Value> {
    let Value::Object(mut call) = call else {
        warn!("Request is not a JSON object");
        return Some(invalid_request(Value::Null));
    };

    let id = call.get("id").cloned();
    if let Err(reason) = check_request(&call) {
        warn!(reason, "Invalid request on stdin");
        return Some(invalid_request(id.unwrap_or(Value::Null)));
    }

    call.entry("jsonrpc").or_insert_with(|| json!("2.0"));
    // jsonrpsee only routes calls that carry an id; the reply is dropped below
    let notification = id.is_none();
    if notification {
        call.insert("id".to_string(), json!(0));
    }

    let reply = match module.raw_json_request(&Value::Object(call).to_string(), 1).await {
        Ok((response, _)) => match serde_json::from_str::<Value>(&response.to_string()) {
            Ok(reply) => reply,
            Err(e) => error_response(
                INVALID_REQUEST_CODE,
                &format!("Unreadable response: {}", e),
                id.clone().unwrap_or(Value::Null),
            ),
        },
        Err(e) => {
            warn!(error = %e, "Request rejected by dispatcher");
            invalid_request(id.clone().unwrap_or(Value::Null))
        }
    };

    if notification {
        debug!("Notification handled, no response written");
        return None;
    }
    Some(reply)
}

/// Structural checks from the JSON-RPC 2.0 request object definition
fn check_request(call: &Map<String, Value>) -> Result<(), &'static str> {
    match call.get("jsonrpc") {
        None => {}
        Some(Value::String(version)) if version == "2.0" => {}
        Some(_) => return Err("jsonrpc must be \"2.0\""),
    }

    match call.get("method") {
        Some(Value::String(_)) => {}
        _ => return Err("method must be a string"),
    }

    match call.get("params") {
        None | Some(Value::Array(_)) | Some(Value::Object(_)) => {}
        Some(_) => return Err("params must be an array or an object"),
    }

    match call.get("id") {
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_)) => Ok(()),
        Some(_) => Err("id must be a string, a number or null"),
    }
}

fn invalid_request(id: Value) -> Value {
    error_response(INVALID_REQUEST_CODE, "Invalid Request", id)
}

fn error_response(code: i32, message: &str, id: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        },
    })
}
