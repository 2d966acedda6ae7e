//! Symptom Retrieval Server - Binary Entry Point
//!
//! Loads the knowledge base named by the `SYMPTOM_*` environment variables
//! and serves JSON-RPC queries on stdin/stdout. Logs go to stderr.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use symptom_retrieval::{KnowledgeBase, KnowledgeBaseConfig, QueryServer};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = KnowledgeBaseConfig::from_env().context("invalid configuration")?;
    let retriever = KnowledgeBase::load(&config).context("failed to load knowledge base")?;

    let mut server = QueryServer::stdio(retriever).context("failed to start server")?;
    server.run().context("server loop failed")?;
    Ok(())
}
