use anyhow::{Context, Result};

/// Downloads bytes from a URL. This must be called with a tokio runtime
/// somewhere.
pub async fn download_bytes<I: AsRef<str>>(url: I) -> Result<Vec<u8>> {
    let url = url.as_ref();
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("downloading {}", url))?;
    resp.error_for_status_ref()
        .with_context(|| format!("downloading {}", url))?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("downloading {}", url))?;
    Ok(bytes.to_vec())
}
