//! Query server implementation
//!
//! This module contains the line-oriented JSON-RPC loop: one request per
//! input line, one response per output line.

mod handlers;

use std::io::{self, BufRead, BufReader, BufWriter, Stdin, Stdout, Write};

use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::protocol::{ErrorObject, JsonRpcRequest, JsonRpcResponse, ServerInfo};
use crate::retrieval::Retriever;

pub use handlers::*;

/// JSON-RPC query server over a line reader and writer
pub struct QueryServer<R, W> {
    server_info: ServerInfo,
    retriever: Retriever,
    runtime: Runtime,
    reader: R,
    writer: W,
}

impl QueryServer<BufReader<Stdin>, BufWriter<Stdout>> {
    /// Create a server on stdin/stdout
    pub fn stdio(retriever: Retriever) -> io::Result<Self> {
        Self::new(retriever, BufReader::new(io::stdin()), BufWriter::new(io::stdout()))
    }
}

impl<R: BufRead, W: Write> QueryServer<R, W> {
    pub fn new(retriever: Retriever, reader: R, writer: W) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()?;
        Ok(Self {
            server_info: ServerInfo::default(),
            retriever,
            runtime,
            reader,
            writer,
        })
    }

    pub fn with_info(mut self, info: ServerInfo) -> Self {
        self.server_info = info;
        self
    }

    /// Run the server until the reader is exhausted (blocking)
    pub fn run(&mut self) -> io::Result<()> {
        info!(server = %self.server_info.name, version = %self.server_info.version, "serving");
        let mut line = String::new();
        while self.reader.read_line(&mut line)? > 0 {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if let Some(response) = self.handle_line(trimmed) {
                    self.send(&response)?;
                }
            }
            line.clear();
        }
        info!("input closed, shutting down");
        Ok(())
    }

    /// Handle one raw request line; `None` for notifications
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.dispatch(request),
            Err(e) => Some(JsonRpcResponse::failure(
                Value::Null,
                ErrorObject::parse_error(e.to_string()),
            )),
        }
    }

    /// Handle one parsed request; `None` for notifications
    pub fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let notification = request.is_notification();
        let id = request.id.clone().unwrap_or(Value::Null);

        if !request.is_valid() {
            return Some(JsonRpcResponse::failure(
                id,
                ErrorObject::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        debug!(method = %request.method, "request");
        let outcome = match request.method.as_str() {
            "retrieve" => self.handle_retrieve(request.params),
            "entities" => entities(&self.retriever, request.params),
            "stats" => stats(&self.retriever),
            "ping" => ping(&self.server_info),
            other => Err(ErrorObject::method_not_found(other)),
        };

        if notification {
            return None;
        }
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn handle_retrieve(&self, params: Option<Value>) -> HandlerResult {
        let params = retrieve_params(params)?;
        let response = self
            .runtime
            .block_on(self.retriever.retrieve_async(&params.query, &params.options));
        to_result(&response)
    }

    fn send(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }

    /// Consume the server, returning its writer
    pub fn into_writer(self) -> W {
        self.writer
    }
}
