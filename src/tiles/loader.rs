use crate::{core::constants::DEFAULT_USER_AGENT, MapError, Result};
use image::ImageFormat;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::time::Duration;

/// Shared blocking HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. `None` if the TLS
/// backend could not be initialised.
static HTTP_CLIENT: Lazy<Option<Client>> = Lazy::new(|| {
    build_client(DEFAULT_USER_AGENT, Duration::from_secs(30))
        .map_err(|e| log::warn!("failed to build default HTTP client: {e}"))
        .ok()
});

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches raw bytes for a URL
pub trait Transport: Send + Sync {
    /// `Err` only for transport failures; HTTP error statuses are responses
    fn get(&self, url: &str) -> Result<TransportResponse>;
}

/// Blocking HTTP transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Option<Client>,
}

impl HttpTransport {
    /// Transport using the shared default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with its own client, user agent and timeout
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Some(build_client(user_agent, timeout)?),
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .or(HTTP_CLIENT.as_ref())
            .ok_or_else(|| MapError::Config("no HTTP client available".to_string()))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<TransportResponse> {
        let response = self.client()?.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

/// Raster format recognised from the leading magic bytes, if any
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes).ok()? {
        format @ (ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Gif
        | ImageFormat::WebP
        | ImageFormat::Bmp
        | ImageFormat::Tiff) => Some(format),
        _ => None,
    }
}
