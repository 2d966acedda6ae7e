//! Protocol types for JSON-RPC communication
//!
//! This module contains the wire envelope and the typed params/results of
//! each server method.

mod jsonrpc;
mod methods;

pub use jsonrpc::{error_codes, ErrorObject, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
pub use methods::{
    EntitiesParams, EntitiesResult, EntitySummary, RetrieveParams, ServerInfo, StatsResult,
};
