use crate::rollcall::*;

use std::time::Duration;

const USER_AGENT: &str = concat!("rollmap/", env!("CARGO_PKG_VERSION"));

/// Where the documents come from. The pipeline only asks for the bytes behind a URL.
pub trait FeedSource {
    fn fetch(&self, url: &str) -> MapResult<Vec<u8>>;
}

/// Fetches documents over HTTP. Anything but a 200 response is an error.
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(timeout_seconds: u64) -> MapResult<HttpSource> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .context(BuildingClientSnafu {})?;
        Ok(HttpSource { client })
    }
}

impl FeedSource for HttpSource {
    fn fetch(&self, url: &str) -> MapResult<Vec<u8>> {
        info!("Fetching {}", url);
        let resp = self.client.get(url).send().context(FetchSnafu { url })?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return HttpStatusSnafu {
                url,
                status: status.as_u16(),
            }
            .fail();
        }
        let bytes = resp.bytes().context(FetchSnafu { url })?;
        debug!("fetch: {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Serves documents from memory. Unknown URLs answer 404.
#[cfg(test)]
pub struct MemorySource {
    documents: std::collections::HashMap<String, Vec<u8>>,
}

#[cfg(test)]
impl MemorySource {
    pub fn new(documents: Vec<(&str, &[u8])>) -> MemorySource {
        MemorySource {
            documents: documents
                .into_iter()
                .map(|(url, bytes)| (url.to_string(), bytes.to_vec()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl FeedSource for MemorySource {
    fn fetch(&self, url: &str) -> MapResult<Vec<u8>> {
        match self.documents.get(url) {
            Some(bytes) => Ok(bytes.clone()),
            None => HttpStatusSnafu { url, status: 404u16 }.fail(),
        }
    }
}
