use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, Result};

pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// GETs `url` and decodes the JSON body. A non-success status becomes
/// `Error::FetchFailed` carrying the status and the response body.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
    kind: &'static str,
    key: &str,
) -> Result<T> {
    let response = client.get(url).query(query).header(reqwest::header::ACCEPT, "application/json").send().await?;
    let status = response.status();

    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        log::error!("GET {} for {} returned {}: {}", url, key, status, body_text);
        return Err(Error::FetchFailed { kind, key: key.to_string(), reason: format!("status {}", status) });
    }

    Ok(response.json().await?)
}

pub fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
