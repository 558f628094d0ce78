//! On-disk cache for ONNX models and tokenizers fetched from Hugging Face.
//!
//! Files land in `$HOME/.cache/docqa/models/<name>/` and are downloaded
//! only once. Used by the tract embedding backend and the QA model.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn cache_dir() -> Result<PathBuf> {
    let base = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let dir = PathBuf::from(base)
        .join(".cache")
        .join("docqa")
        .join("models");
    std::fs::create_dir_all(&dir).map_err(|e| anyhow!("Create cache dir: {}", e))?;
    Ok(dir)
}

fn download_to_cache(repo: &str, path: &str, cache_path: &Path) -> Result<()> {
    if cache_path.exists() {
        return Ok(());
    }
    let url = format!(
        "https://huggingface.co/{}/resolve/main/{}",
        repo,
        path.replace(' ', "%20")
    );
    info!(%url, "downloading model file");
    let resp = reqwest::blocking::get(&url)
        .map_err(|e| anyhow!("Download {}: {}", url, e))?
        .error_for_status()
        .map_err(|e| anyhow!("Download {}: {}", url, e))?;
    let bytes = resp.bytes().map_err(|e| anyhow!("Read body: {}", e))?;
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| anyhow!("Create cache parent: {}", e))?;
    }
    std::fs::write(cache_path, &bytes).map_err(|e| anyhow!("Write cache: {}", e))?;
    Ok(())
}

/// Ensure `onnx_rel` and `tokenizer_rel` from `repo` are cached under
/// `name`; return their local paths.
pub fn ensure_cached(
    name: &str,
    repo: &str,
    onnx_rel: &str,
    tokenizer_rel: &str,
) -> Result<(PathBuf, PathBuf)> {
    ensure_cached_in(&cache_dir()?.join(name), repo, onnx_rel, tokenizer_rel)
}

/// Blocking: call from a plain thread or `spawn_blocking`, never from an
/// async task.
fn ensure_cached_in(
    model_dir: &Path,
    repo: &str,
    onnx_rel: &str,
    tokenizer_rel: &str,
) -> Result<(PathBuf, PathBuf)> {
    let onnx_path = model_dir.join(onnx_rel);
    let tokenizer_path = model_dir.join(tokenizer_rel);
    download_to_cache(repo, onnx_rel, &onnx_path)?;
    download_to_cache(repo, tokenizer_rel, &tokenizer_path)?;
    Ok((onnx_path, tokenizer_path))
}
