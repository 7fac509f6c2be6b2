use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, Once,
    },
};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Incoming,
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
    HeaderMap, Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use url::Url;

static INIT: Once = Once::new();

pub(crate) fn setup() {
    INIT.call_once(|| {
        let _ = simple_logger::init_with_level(log::Level::Debug);
    });
}

/// 测试服务收到的一个请求
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub(crate) type Captured = Arc<Mutex<Vec<Recorded>>>;

type Script = Arc<Mutex<VecDeque<u16>>>;

async fn respond(req: Request<Incoming>, sink: Captured, script: Script) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    sink.lock().unwrap().push(Recorded {
        method: parts.method,
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    });

    // 脚本用完之后一律返回 500
    let status = script.lock().unwrap().pop_front().unwrap_or(500);

    let mut response = Response::new(Full::new(Bytes::from_static(br#"{"ok":true}"#)));
    *response.status_mut() = StatusCode::from_u16(status).unwrap();
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(response)
}

/// 一个按顺序返回给定状态码的 HTTP 服务，记录收到的每个请求
pub(crate) async fn serve(statuses: Vec<u16>) -> (Url, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::default();
    let script: Script = Arc::new(Mutex::new(VecDeque::from(statuses)));
    let sink = captured.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let sink = sink.clone();
            let script = script.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| respond(req, sink.clone(), script.clone()));

                if let Err(e) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
                    log::debug!("test server connection closed: {}", e);
                }
            });
        }
    });

    let url = Url::parse(&format!("http://{}/api/v1/write?db=_internal", addr)).unwrap();
    (url, captured)
}

/// 只接受连接、从不响应的服务。返回已经接受的连接数
pub(crate) async fn serve_silently() -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        // 连接保持打开，直到测试结束
        let mut held = vec![];
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });

    let url = Url::parse(&format!("http://{}/api/v1/write?db=_internal", addr)).unwrap();
    (url, accepted)
}

/// 一个没有服务监听的地址
pub(crate) fn closed_port_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    Url::parse(&format!("http://{}/api/v1/write?db=_internal", addr)).unwrap()
}
