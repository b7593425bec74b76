//! CLI command implementations

use crate::config::StorageConfig;
use crate::resolve;
use crate::s3::{ObjectContent, S3PresignerV4, StorageClient, TransferMethod};
use anyhow::{bail, Context, Result};
use futures::StreamExt;
use http_body_util::BodyStream;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Print a presigned URL for the given method and key
pub fn cmd_presign(config: &StorageConfig, method: &str, key: &str) -> Result<()> {
    let method = match method.to_ascii_uppercase().as_str() {
        "PUT" => TransferMethod::Put,
        "GET" => TransferMethod::Get,
        "DELETE" => TransferMethod::Delete,
        other => bail!("Unsupported method {:?} (expected PUT, GET, or DELETE)", other),
    };

    let signer = S3PresignerV4::new(config)?;
    println!("{}", signer.presigned_url(method, key)?);
    Ok(())
}

/// Upload a local file under the given key
pub async fn cmd_put(
    client: &StorageClient,
    file: &Path,
    key: &str,
    content_type: Option<&str>,
) -> Result<()> {
    let data = std::fs::read(file).context(format!("Failed to read {:?}", file))?;
    let size = data.len();

    let mut content = ObjectContent::new(data);
    if let Some(content_type) = content_type {
        content = content.with_content_type(content_type);
    }

    let key = client.upload_object(content, key).await?;
    info!(key = %key, bytes = size, "uploaded");
    println!("{}", key);
    Ok(())
}

/// Fetch an object, streaming the body to a file or stdout
///
/// Response chunks go straight from the network to a BufWriter; the body is
/// never held in memory whole.
pub async fn cmd_get(client: &StorageClient, key: &str, output: Option<&Path>) -> Result<()> {
    let fetched = client.fetch_object(key).await?;

    if let Some(content_type) = fetched.header("content-type") {
        info!(key = %key, content_type = %content_type, "fetching");
    }

    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .context(format!("Failed to create {:?}", path))?;
            Box::new(std::io::BufWriter::with_capacity(256 * 1024, file))
        }
        None => Box::new(std::io::stdout().lock()),
    };

    let mut body = BodyStream::new(fetched.body);
    let mut total_bytes = 0u64;

    while let Some(frame) = body.next().await {
        let frame = frame.context("Failed reading response body")?;
        if let Some(chunk) = frame.data_ref() {
            writer.write_all(chunk)?;
            total_bytes += chunk.len() as u64;
        }
    }

    writer.flush()?;
    info!(key = %key, bytes = total_bytes, "fetched");
    Ok(())
}

/// Delete the given keys, concurrently and best-effort
pub async fn cmd_rm(client: &StorageClient, keys: &[String]) -> Result<()> {
    client.delete_objects(keys).await;
    info!(count = keys.len(), "delete attempted");
    Ok(())
}

/// Resolve a stored reference to its bare object key
pub fn cmd_resolve(config: &StorageConfig, stored: &str) -> Result<()> {
    match resolve::resolve_key_in_bucket(stored, &config.bucket) {
        Some(key) => {
            println!("{}", key);
            Ok(())
        }
        None => bail!("No object key could be resolved from {:?}", stored),
    }
}
