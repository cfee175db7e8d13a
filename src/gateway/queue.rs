//! Serialized request queue and drain loop
//!
//! Call lifecycle: `Queued -> Draining -> Dispatched -> Resolved | Rejected`.
//!
//! - A cache hit resolves without touching the queue.
//! - A miss appends a [`PendingRequest`] to the single FIFO queue. Callers that
//!   ask for an identity already waiting in the queue join that entry instead
//!   of adding another one.
//! - One drain loop consumes the queue, dispatching at most one request per
//!   minimum interval. It exits when the queue is empty and is respawned by
//!   the next miss, so nothing runs while the gateway is idle.
//! - The drain loop is the only cache writer and the only queue consumer.
//!
//! There is no per-request timeout beyond the transport's own: a transport
//! call that never returns holds its queue slot and everything behind it.

use once_cell::sync::OnceCell;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::cache::ResponseCache;
use super::config::{ConfigError, GatewayConfig};
use super::identity::{ApiRequest, RequestIdentity};
use super::rate_limit::RateLimiter;
use super::transport::{HttpTransport, Transport};
use super::{classify_response, UpstreamError};
use crate::metrics;
use crate::shutdown::SharedShutdown;

type Reply = oneshot::Sender<Result<Value, UpstreamError>>;

/// Queued upstream call and every caller waiting on it
struct PendingRequest {
    identity: RequestIdentity,
    request: ApiRequest,
    waiters: Vec<Reply>,
    enqueued_at: Instant,
}

impl PendingRequest {
    fn new(identity: RequestIdentity, request: ApiRequest, waiter: Reply) -> Self {
        Self {
            identity,
            request,
            waiters: vec![waiter],
            enqueued_at: Instant::now(),
        }
    }

    /// Deliver the outcome to every waiter; consumes the entry
    fn settle(self, result: Result<Value, UpstreamError>) {
        for waiter in self.waiters {
            // A waiter that gave up has dropped its receiver
            let _ = waiter.send(result.clone());
        }
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingRequest>,
    draining: bool,
}

struct GatewayInner {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    limiter: RateLimiter,
    queue: Mutex<QueueState>,
    shutdown: OnceCell<SharedShutdown>,
    dispatched: AtomicU64,
}

/// Rate-limited, caching gateway to the campaign provider
///
/// Cloning is cheap and every clone shares the same queue and cache.
/// Construct one per provider account and inject it where needed.
#[derive(Clone)]
pub struct RequestGateway {
    inner: Arc<GatewayInner>,
}

impl RequestGateway {
    /// Create a gateway over an arbitrary transport
    ///
    /// Uses `rate_limit_delay` and `cache_ttl` from `config`.
    pub fn new(config: &GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                transport,
                cache: ResponseCache::new(config.cache_ttl),
                limiter: RateLimiter::new(config.rate_limit_delay),
                queue: Mutex::new(QueueState::default()),
                shutdown: OnceCell::new(),
                dispatched: AtomicU64::new(0),
            }),
        }
    }

    /// Validate `config` and create a gateway over the HTTP transport
    pub fn with_http(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(&config, Arc::new(transport)))
    }

    /// Attach a shutdown handle; queued requests are rejected once it fires
    pub fn with_shutdown(self, shutdown: SharedShutdown) -> Self {
        if self.inner.shutdown.set(shutdown).is_err() {
            debug!("Gateway shutdown handle already set, keeping the first one");
        }
        self
    }

    /// Response cache shared by every clone of this gateway
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// Number of transport calls made so far
    pub fn dispatched_count(&self) -> u64 {
        self.inner.dispatched.load(Ordering::SeqCst)
    }

    /// Number of queue entries waiting for dispatch
    pub async fn queue_len(&self) -> usize {
        self.inner.queue.lock().await.pending.len()
    }

    /// Perform `request`, from cache when possible
    ///
    /// # Errors
    /// The classified [`UpstreamError`] of the transport call. Errors are
    /// never retried here.
    pub async fn request(&self, request: ApiRequest) -> Result<Value, UpstreamError> {
        let identity = request.identity();
        let resource = request.resource().to_string();

        if let Some(payload) = self.inner.cache.get(&identity).await {
            metrics::record_cache_lookup(&resource, true);
            debug!(identity = %identity, "Cache hit");
            return Ok(payload);
        }
        metrics::record_cache_lookup(&resource, false);

        if self.inner.is_shutdown_requested() {
            return Err(UpstreamError::Cancelled);
        }

        let (tx, rx) = oneshot::channel();
        let start_drain = {
            let mut queue = self.inner.queue.lock().await;

            match queue.pending.iter_mut().find(|p| p.identity == identity) {
                Some(pending) => {
                    debug!(identity = %identity, "Joining queued request");
                    pending.waiters.push(tx);
                }
                None => {
                    debug!(identity = %identity, depth = queue.pending.len(), "Queueing request");
                    queue.pending.push_back(PendingRequest::new(identity, request, tx));
                }
            }
            metrics::set_queue_depth(queue.pending.len());

            !std::mem::replace(&mut queue.draining, true)
        };

        if start_drain {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.drain().await });
        }

        rx.await
            .unwrap_or_else(|_| Err(UpstreamError::Unknown("drain loop stopped before replying".to_string())))
    }
}

impl GatewayInner {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown
            .get()
            .is_some_and(|s| s.is_shutdown_requested())
    }

    /// Consume the queue until it is empty
    async fn drain(self: Arc<Self>) {
        debug!("Drain loop started");
        loop {
            let next = {
                let mut queue = self.queue.lock().await;
                match queue.pending.pop_front() {
                    Some(pending) => {
                        metrics::set_queue_depth(queue.pending.len());
                        pending
                    }
                    None => {
                        queue.draining = false;
                        break;
                    }
                }
            };

            self.process(next).await;
        }
        debug!("Drain loop idle, stopping");
    }

    async fn process(&self, pending: PendingRequest) {
        if self.is_shutdown_requested() {
            debug!(identity = %pending.identity, "Rejecting queued request after shutdown");
            pending.settle(Err(UpstreamError::Cancelled));
            return;
        }

        // An identical request may have completed while this one waited
        if let Some(payload) = self.cache.get(&pending.identity).await {
            debug!(identity = %pending.identity, "Served from cache at dispatch time");
            pending.settle(Ok(payload));
            return;
        }

        let throttled = self.limiter.acquire().await;
        metrics::record_queue_wait(pending.enqueued_at.elapsed());

        let resource = pending.request.resource().to_string();
        let started = Instant::now();
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        debug!(
            identity = %pending.identity,
            waiters = pending.waiters.len(),
            throttled_ms = throttled.as_millis() as u64,
            "Dispatching request"
        );

        let result = match self.transport.send(&pending.request).await {
            Ok(response) => classify_response(response),
            Err(e) => Err(UpstreamError::Unknown(e.to_string())),
        };

        match &result {
            Ok(payload) => {
                metrics::record_upstream_request(&resource, "success", started.elapsed());
                self.cache.put(pending.identity.clone(), payload.clone()).await;
            }
            Err(e) => {
                metrics::record_upstream_request(&resource, e.label(), started.elapsed());
                warn!(identity = %pending.identity, error = %e, "Upstream request failed");
            }
        }

        pending.settle(result);
    }
}
