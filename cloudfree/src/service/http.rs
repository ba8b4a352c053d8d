//! HTTP implementation of the imagery service.

use std::env;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::config::ServiceConfig;
use super::error::{ServiceError, ServiceResult};
use super::traits::{BundleFetcher, ImageService, RemoteBody};
use super::types::{
    CompositeImage, CompositeRequest, DownloadParams, ExportParams, ExportTask, ImageRef,
    SearchQuery, SearchRecord, TaskStatus,
};
use crate::image::ImageInfo;

/// Error envelope returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    images: Vec<SearchRecord>,
}

fn build_client(config: &ServiceConfig) -> ServiceResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ServiceError::Http(format!("Failed to create HTTP client: {}", e)))
}

/// Imagery service reached over HTTPS with a bearer token.
pub struct HttpImageService {
    client: Client,
    endpoint: String,
    project: String,
    token: String,
}

impl std::fmt::Debug for HttpImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageService")
            .field("endpoint", &self.endpoint)
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl HttpImageService {
    /// Create a client, reading the bearer token from the configured
    /// environment variable.
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        let token = env::var(&config.token_env).map_err(|_| {
            ServiceError::Auth(format!(
                "set the {} environment variable to an OAuth access token",
                config.token_env
            ))
        })?;
        Self::with_token(config, token)
    }

    /// Create a client with an explicit bearer token.
    pub fn with_token(config: &ServiceConfig, token: impl Into<String>) -> ServiceResult<Self> {
        if config.project.is_empty() {
            return Err(ServiceError::Auth(
                "no project configured; set service.project".to_string(),
            ));
        }

        Ok(Self {
            client: build_client(config)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            token: token.into(),
        })
    }

    fn project_url(&self, method: &str) -> String {
        format!("{}/projects/{}/{}", self.endpoint, self.project, method)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> ServiceResult<T> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| ServiceError::Http(format!("Request failed: {}", e)))?;
        decode_response(url, response)
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> ServiceResult<T> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| ServiceError::Http(format!("Request failed: {}", e)))?;
        decode_response(url, response)
    }
}

/// Decode a JSON body, turning error envelopes into [`ServiceError::Api`].
fn decode_response<T: DeserializeOwned>(url: &str, response: Response) -> ServiceResult<T> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| ServiceError::Http(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|envelope| envelope.error.message)
            .unwrap_or(text);
        return Err(ServiceError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| ServiceError::Decode {
        endpoint: url.to_string(),
        reason: e.to_string(),
    })
}

impl ImageService for HttpImageService {
    fn image_info(&self, image: &ImageRef) -> ServiceResult<ImageInfo> {
        self.post(&self.project_url("image:info"), &json!({ "image": image }))
    }

    fn download_url(&self, image: &ImageRef, params: &DownloadParams) -> ServiceResult<String> {
        let body = json!({ "image": image, "params": params });
        let response: DownloadUrlResponse =
            self.post(&self.project_url("image:getDownloadUrl"), &body)?;
        Ok(response.url)
    }

    fn start_export(&self, image: &ImageRef, params: &ExportParams) -> ServiceResult<ExportTask> {
        let body = json!({ "image": image, "params": params });
        let mut task: ExportTask = self.post(&self.project_url("image:export"), &body)?;
        if task.description.is_empty() {
            task.description = params.description.clone();
        }
        Ok(task)
    }

    fn task_status(&self, task: &ExportTask) -> ServiceResult<TaskStatus> {
        let url = format!("{}/{}", self.endpoint, task.name);
        let value: Value = self.get(&url)?;
        Ok(TaskStatus::from_value(value))
    }

    fn search(&self, query: &SearchQuery) -> ServiceResult<Vec<SearchRecord>> {
        let response: SearchResponse = self.post(&self.project_url("collection:search"), query)?;
        Ok(response.images)
    }

    fn composite(&self, request: &CompositeRequest) -> ServiceResult<CompositeImage> {
        self.post(&self.project_url("collection:composite"), request)
    }
}

/// Streams download links with a plain HTTP GET.
#[derive(Debug)]
pub struct HttpBundleFetcher {
    client: Client,
}

impl HttpBundleFetcher {
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

impl BundleFetcher for HttpBundleFetcher {
    fn fetch(&self, url: &str) -> ServiceResult<RemoteBody> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ServiceError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: format!("HTTP {} from download link", status),
            });
        }

        let content_length = response.content_length();
        Ok(RemoteBody {
            reader: Box::new(response),
            content_length,
        })
    }
}
