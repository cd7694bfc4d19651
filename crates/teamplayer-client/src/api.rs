//! TeamPlayer HTTP API client.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use teamplayer_proto::records::{
    PlayerInfo, QueueEntry, SongId, SongInfo, StationId, StationRecord, UploadResponse,
};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::effect::StationTarget;
use crate::queue::reorder_body;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
    #[error("bad url {0:?}")]
    Url(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    home_station: StationId,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        session_id: Option<&str>,
        home_station: StationId,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|_| ApiError::Url(base_url.to_string()))?;

        let mut headers = HeaderMap::new();
        // The station pages render HTML unless JSON is asked for explicitly.
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(session) = session_id {
            let cookie = HeaderValue::from_str(&format!("sessionid={}", session))
                .map_err(|_| ApiError::Url(format!("invalid session id {:?}", session)))?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder()
            .user_agent(concat!("teamplayer-client/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base,
            home_station,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|_| ApiError::Url(path.to_string()))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.request(method, self.url(path)?))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        Ok(response.json().await?)
    }

    pub async fn queue(&self) -> Result<Vec<QueueEntry>, ApiError> {
        self.get_json("queue/").await
    }

    pub async fn currently_playing(&self) -> Result<SongInfo, ApiError> {
        self.get_json("currently_playing").await
    }

    pub async fn stations(&self) -> Result<Vec<StationRecord>, ApiError> {
        self.get_json("stations/").await
    }

    /// The station created by the local user, if there is one.
    pub async fn my_station(&self) -> Result<Option<StationRecord>, ApiError> {
        match self.get_json("stations/mine").await {
            Ok(station) => Ok(Some(station)),
            Err(ApiError::Status(StatusCode::NOT_FOUND)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn players(&self) -> Result<Vec<PlayerInfo>, ApiError> {
        self.get_json("players/").await
    }

    /// Tune to another station.  The server answers with the new station,
    /// following redirects for previous/next.
    pub async fn change_station(&self, target: &StationTarget) -> Result<StationRecord, ApiError> {
        let path = match target {
            StationTarget::Previous => "station/prev".to_string(),
            StationTarget::Next => "station/next".to_string(),
            StationTarget::Home => format!("station/{}/", self.home_station),
            StationTarget::Url(url) => url.clone(),
        };
        self.get_json(&path).await
    }

    pub async fn reorder(&self, ids: &[SongId]) -> Result<Vec<SongId>, ApiError> {
        let builder = self
            .request(Method::POST, "reorder_queue")?
            .body(reorder_body(ids));
        Ok(self.send(builder).await?.json().await?)
    }

    pub async fn remove(&self, id: SongId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("queue/{}", id))?;
        self.send(builder).await?;
        Ok(())
    }

    /// Returns the server's validation message when the name was rejected.
    pub async fn change_dj_name(&self, name: &str) -> Result<Option<String>, ApiError> {
        let builder = self
            .request(Method::POST, "change_dj_name")?
            .form(&[("dj_name", name)]);
        let response = self.send(builder).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let message = response.text().await?;
        let message = message.trim();
        Ok((!message.is_empty()).then(|| message.to_string()))
    }

    pub async fn toggle_queue(&self) -> Result<bool, ApiError> {
        let response = self.send(self.request(Method::POST, "queue/toggle")?).await?;
        Ok(response.json().await?)
    }

    pub async fn shuffle(&self) -> Result<Vec<QueueEntry>, ApiError> {
        self.get_json("queue/shuffle").await
    }

    pub async fn order_by_rank(&self) -> Result<Vec<QueueEntry>, ApiError> {
        self.get_json("queue/order_by_rank").await
    }

    /// Upload a song file.  `progress` is called with `(loaded, total)` as
    /// chunks are handed to the connection.
    pub async fn upload<F>(&self, path: &Path, mut progress: F) -> Result<UploadResponse, ApiError>
    where
        F: FnMut(u64, u64) + Send + Sync + 'static,
    {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut loaded = 0u64;
        let stream = ReaderStream::new(file).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                loaded += bytes.len() as u64;
                progress(loaded, total);
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total).file_name(name);
        let builder = self
            .request(Method::POST, "queue/add")?
            .multipart(Form::new().part("file", part));
        Ok(self.send(builder).await?.json().await?)
    }
}
