use std::time::Duration;

use bytes::Bytes;
use error::LoadError;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT},
    Response, StatusCode,
};
use url::Url;

pub mod batch;
pub mod compress;
pub mod config;
pub mod error;
pub mod field_table;
pub mod model;
pub mod pipeline;
pub mod protos;
pub mod row;
pub mod simulator;
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod test_util;

pub use pipeline::{generate, Pipeline, RunSummary};

const USER_AGENT_VALUE: &str = "lindb-loadgen/0.1.0";

/// 写入接口要求的响应格式
pub const ACCEPT_JSON: &str = "application/json";

/// 写入负载的格式：首尾相接的 flat metrics 行
pub const CONTENT_TYPE_FLATBUFFER: &str = "application/flatbuffer";

pub type LoadResult<T> = Result<T, LoadError>;

/// 发往写入接口的一次请求
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// 压缩后的批次数据
    pub body: Bytes,

    /// 压缩算法名称，作为 `Content-Encoding` 发送
    pub content_encoding: &'static str,
}

impl WriteRequest {
    pub fn new(body: Bytes, content_encoding: &'static str) -> Self {
        Self { body, content_encoding }
    }
}

/// 把压缩好的批次发送到目标库
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// 发送一个批次。返回之前不会有新的批次开始
    async fn push(&mut self, request: WriteRequest) -> LoadResult<()>;
}

pub trait RetryPolicy: std::fmt::Debug + Send + Sync {
    /// 是否需要重试。参数分别表示已经重试的次数和发生的错误
    fn should_retry(&self, retried: u32, error: &LoadError) -> bool;

    /// 第 `retried` 次重试之前等待的时间
    fn delay_ms(&self, retried: u32) -> u64;

    /// 需要自行实现克隆逻辑
    fn clone_box(&self) -> Box<dyn RetryPolicy>;
}

impl Clone for Box<dyn RetryPolicy> {
    fn clone(&self) -> Box<dyn RetryPolicy> {
        self.clone_box()
    }
}

/// 默认重试机制：超时、连接错误、5xx、408 以及 429 会重试，其他错误直接返回。
/// 重试间隔从 `base_delay_ms` 开始翻倍，最多等待 `max_delay_ms`
#[derive(Debug, Copy, Clone)]
pub struct DefaultRetryPolicy {
    pub max_retry_times: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for DefaultRetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_times: config::DEFAULT_MAX_RETRIES,
            base_delay_ms: config::DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: config::DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl DefaultRetryPolicy {
    /// 判断错误本身是否可以重试，不考虑次数
    pub fn is_retryable(error: &LoadError) -> bool {
        match error {
            // 网络层面的错误
            LoadError::ReqwestError(e) => e.is_timeout() || e.is_connect() || e.is_request(),

            LoadError::StatusError(code, _) => {
                code.is_server_error() || *code == StatusCode::REQUEST_TIMEOUT || *code == StatusCode::TOO_MANY_REQUESTS
            }

            _ => false,
        }
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn should_retry(&self, retried: u32, error: &LoadError) -> bool {
        if retried >= self.max_retry_times {
            log::info!("max retry reached {} times with error {}", self.max_retry_times, error);
            return false;
        }

        Self::is_retryable(error)
    }

    fn delay_ms(&self, retried: u32) -> u64 {
        let factor = 1u64.checked_shl(retried).unwrap_or(u64::MAX);
        self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms)
    }

    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(*self)
    }
}

#[derive(Debug, Clone)]
pub struct WriteClientOptions {
    pub timeout_ms: Option<u64>,
    pub retry_policy: Box<dyn RetryPolicy>,
}

impl WriteClientOptions {
    pub fn new() -> Self {
        Self {
            retry_policy: Box::new(DefaultRetryPolicy::default()),
            timeout_ms: Some(config::DEFAULT_TIMEOUT_MS),
        }
    }
}

impl Default for WriteClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&config::WriterConfig> for WriteClientOptions {
    fn from(value: &config::WriterConfig) -> Self {
        Self {
            timeout_ms: value.timeout_ms,
            retry_policy: Box::new(DefaultRetryPolicy {
                max_retry_times: value.max_retries,
                base_delay_ms: value.retry_base_delay_ms,
                max_delay_ms: value.retry_max_delay_ms,
            }),
        }
    }
}

/// LinDB write api client
#[derive(Debug, Clone)]
pub struct WriteClient {
    write_url: Url,
    http_client: reqwest::Client,
    options: WriteClientOptions,
}

impl WriteClient {
    pub fn new(write_url: Url, options: WriteClientOptions) -> Self {
        Self {
            write_url,
            http_client: reqwest::Client::new(),
            options,
        }
    }

    /// 根据写入端配置创建客户端
    pub fn from_config(config: &config::WriterConfig) -> LoadResult<Self> {
        let url = config.write_url()?;
        Ok(Self::new(url, WriteClientOptions::from(config)))
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }

    fn prepare_headers(content_encoding: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FLATBUFFER));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(content_encoding));
        headers
    }

    /// 用 PUT 发送一个批次。失败时按照重试策略重试，每次重试都发送同一份数据
    pub async fn send(&self, req: WriteRequest) -> LoadResult<Response> {
        let WriteRequest { body, content_encoding } = req;
        let headers = Self::prepare_headers(content_encoding);

        let mut retried = 0u32;

        loop {
            let mut request_builder = self.http_client.put(self.write_url.clone()).headers(headers.clone()).body(body.clone());

            if let Some(ms) = self.options.timeout_ms {
                request_builder = request_builder.timeout(Duration::from_millis(ms));
            }

            let e = match request_builder.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),

                Ok(response) => {
                    let status = response.status();
                    let message = response.text().await.unwrap_or_default();
                    LoadError::StatusError(status, message)
                }

                Err(e) => LoadError::from(e),
            };

            log::error!("write request failed, check retry against retry policy for error {}", e);
            let should_retry = self.options.retry_policy.should_retry(retried, &e);
            log::info!("should retry {} for error {}", should_retry, e);

            if !should_retry {
                return Err(e);
            }

            let next_delay = self.options.retry_policy.delay_ms(retried);
            log::info!("delay for {} ms to retry", next_delay);
            tokio::time::sleep(Duration::from_millis(next_delay)).await;

            retried += 1;
        }
    }
}

impl Transport for WriteClient {
    async fn push(&mut self, request: WriteRequest) -> LoadResult<()> {
        let size = request.body.len();
        let response = self.send(request).await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        log::debug!("pushed {} bytes to {}, status: {}, response: {}", size, self.write_url, status, text);

        Ok(())
    }
}

#[cfg(test)]
mod test_write_client {
    use std::{
        sync::atomic::Ordering,
        time::{Duration, Instant},
    };

    use bytes::Bytes;
    use reqwest::{Method, StatusCode};

    use crate::{
        error::LoadError,
        test_util::{closed_port_url, serve, serve_silently, setup},
        DefaultRetryPolicy, RetryPolicy, Transport, WriteClient, WriteClientOptions, WriteRequest,
    };

    fn fast_retry_options(max_retry_times: u32) -> WriteClientOptions {
        WriteClientOptions {
            timeout_ms: Some(5_000),
            retry_policy: Box::new(DefaultRetryPolicy {
                max_retry_times,
                base_delay_ms: 1,
                max_delay_ms: 5,
            }),
        }
    }

    #[tokio::test]
    async fn test_push_headers_and_body() {
        setup();
        let (url, captured) = serve(vec![204]).await;
        let mut client = WriteClient::new(url, fast_retry_options(0));

        client.push(WriteRequest::new(Bytes::from_static(b"payload"), "gzip")).await.unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(1, captured.len());

        let req = &captured[0];
        assert_eq!(Method::PUT, req.method);
        assert_eq!("/api/v1/write?db=_internal", req.uri);
        assert_eq!(Some("application/json"), req.header("accept"));
        assert_eq!(Some("application/flatbuffer"), req.header("content-type"));
        assert_eq!(Some("gzip"), req.header("content-encoding"));
        assert_eq!(&b"payload"[..], &req.body[..]);
    }

    #[tokio::test]
    async fn test_retry_on_server_error_resends_same_body() {
        setup();
        let (url, captured) = serve(vec![503, 500, 200]).await;
        let mut client = WriteClient::new(url, fast_retry_options(3));

        client.push(WriteRequest::new(Bytes::from_static(b"batch-0"), "gzip")).await.unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(3, captured.len());
        assert!(captured.iter().all(|req| req.body == Bytes::from_static(b"batch-0")));
    }

    #[tokio::test]
    async fn test_client_error_is_terminal() {
        setup();
        let (url, captured) = serve(vec![400, 200]).await;
        let mut client = WriteClient::new(url, fast_retry_options(3));

        let res = client.push(WriteRequest::new(Bytes::from_static(b"bad"), "gzip")).await;

        match res {
            Err(LoadError::StatusError(code, message)) => {
                assert_eq!(StatusCode::BAD_REQUEST, code);
                assert!(message.contains("ok"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(1, captured.lock().unwrap().len());
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        setup();
        let (url, captured) = serve(vec![502, 502, 502]).await;
        let mut client = WriteClient::new(url, fast_retry_options(2));

        let res = client.push(WriteRequest::new(Bytes::from_static(b"x"), "gzip")).await;

        assert!(matches!(res, Err(LoadError::StatusError(StatusCode::BAD_GATEWAY, _))));
        assert_eq!(3, captured.lock().unwrap().len());
    }

    #[tokio::test]
    async fn test_timeout_is_retried() {
        setup();
        let (url, accepted) = serve_silently().await;

        let mut options = fast_retry_options(2);
        options.timeout_ms = Some(200);
        let mut client = WriteClient::new(url, options);

        let res = client.push(WriteRequest::new(Bytes::from_static(b"slow"), "gzip")).await;

        match res {
            Err(LoadError::ReqwestError(e)) => assert!(e.is_timeout(), "{:?}", e),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(3, accepted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connect_error_is_retried() {
        setup();
        let mut client = WriteClient::new(
            closed_port_url(),
            WriteClientOptions {
                timeout_ms: Some(1_000),
                retry_policy: Box::new(DefaultRetryPolicy {
                    max_retry_times: 2,
                    base_delay_ms: 50,
                    max_delay_ms: 100,
                }),
            },
        );

        let start = Instant::now();
        let res = client.push(WriteRequest::new(Bytes::from_static(b"x"), "gzip")).await;

        match res {
            Err(LoadError::ReqwestError(ref e)) => assert!(e.is_connect(), "{:?}", e),
            ref other => panic!("unexpected result: {:?}", other),
        }
        assert!(DefaultRetryPolicy::is_retryable(res.as_ref().unwrap_err()));

        // 两次重试之间分别等待 50ms 和 100ms
        assert!(start.elapsed() >= Duration::from_millis(150), "{:?}", start.elapsed());
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = DefaultRetryPolicy {
            max_retry_times: 2,
            base_delay_ms: 100,
            max_delay_ms: 250,
        };

        let unavailable = LoadError::StatusError(StatusCode::SERVICE_UNAVAILABLE, String::new());
        let throttled = LoadError::StatusError(StatusCode::TOO_MANY_REQUESTS, String::new());
        let bad_request = LoadError::StatusError(StatusCode::BAD_REQUEST, String::new());
        let bad_tag = LoadError::UnsupportedTagValue {
            key: "k".to_string(),
            kind: "double",
        };

        assert!(policy.should_retry(0, &unavailable));
        assert!(policy.should_retry(1, &throttled));
        assert!(!policy.should_retry(2, &unavailable));
        assert!(!policy.should_retry(0, &bad_request));
        assert!(!policy.should_retry(0, &bad_tag));

        assert_eq!(100, policy.delay_ms(0));
        assert_eq!(200, policy.delay_ms(1));
        assert_eq!(250, policy.delay_ms(2));
        assert_eq!(250, policy.delay_ms(80));
    }
}
