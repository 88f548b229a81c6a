use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;
use triage_core::config::BrokerConfig;
use triage_core::{EventKind, EventRecord};

use crate::broker::{Broker, BrokerHealth, Delivery};
use crate::error::{BrokerError, Result};

const STREAMS: [&str; 4] = ["event", "verification", "retrieval", "classification"];

/// Talks to a real streams server over the redis protocol — the
/// process-external counterpart to `InMemoryBroker` that lets the five
/// stage binaries actually share state when run as separate processes.
/// Direct mode opens a single connection; sentinel mode discovers the
/// current master through a sentinel quorum before connecting.
pub struct RedisBroker {
    conn: Mutex<ConnectionManager>,
}

impl RedisBroker {
    /// Builds the connection implied by a `BrokerConfig` — direct or
    /// sentinel, whichever `BROKER_MODE` selected.
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        match config {
            BrokerConfig::Direct { host, port, db, password } => {
                Self::connect_direct(host, *port, *db, password.as_deref()).await
            }
            BrokerConfig::Sentinel { hosts, master_set, password } => {
                Self::connect_sentinel(hosts, master_set, password.as_deref()).await
            }
        }
    }

    pub async fn connect_direct(host: &str, port: u16, db: u16, password: Option<&str>) -> Result<Self> {
        let url = match password {
            Some(pw) => format!("redis://:{pw}@{host}:{port}/{db}"),
            None => format!("redis://{host}:{port}/{db}"),
        };
        let client = Client::open(url).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub async fn connect_sentinel(hosts: &[String], master_set: &str, password: Option<&str>) -> Result<Self> {
        use redis::sentinel::{Sentinel, SentinelNodeConnectionInfo};

        let urls: Vec<String> = hosts.iter().map(|h| format!("redis://{h}")).collect();
        let mut sentinel = Sentinel::build(urls).map_err(|e| BrokerError::Connection(e.to_string()))?;

        let node_info = password.map(|pw| SentinelNodeConnectionInfo {
            tls_mode: None,
            redis_connection_info: Some(redis::RedisConnectionInfo {
                password: Some(pw.to_string()),
                ..Default::default()
            }),
        });

        let client = sentinel
            .async_master_for(master_set, node_info.as_ref())
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn append(&self, stream: &str, record: EventRecord) -> Result<String> {
        let payload = serde_json::to_string(&record.payload).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let mut conn = self.conn.lock().await;
        let id: String = conn
            .xadd(stream, "*", &[(record.kind.as_str(), payload.as_str())])
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(id)
    }

    async fn read_one(&self, stream: &str, timeout: Duration) -> Result<Option<Delivery>> {
        let opts = StreamReadOptions::default()
            .count(1)
            .block(timeout.as_millis().max(1) as usize);

        let reply: StreamReadReply = {
            let mut conn = self.conn.lock().await;
            conn.xread_options(&[stream], &["0"], &opts)
                .await
                .map_err(|e| BrokerError::Connection(e.to_string()))?
        };

        let Some(stream_key) = reply.keys.into_iter().next() else {
            return Ok(None);
        };
        let Some(stream_id) = stream_key.ids.into_iter().next() else {
            return Ok(None);
        };

        let (field, value) = stream_id
            .map
            .into_iter()
            .next()
            .ok_or_else(|| BrokerError::Connection("stream entry had no fields".to_string()))?;
        let kind: EventKind = field
            .parse()
            .map_err(|e: triage_core::UnknownEventKind| BrokerError::Connection(e.to_string()))?;
        let raw: String = redis::from_redis_value(&value).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let payload: serde_json::Value = serde_json::from_str(&raw).map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Some(Delivery {
            message_id: stream_id.id,
            record: EventRecord::new(kind, payload),
        }))
    }

    async fn delete(&self, stream: &str, message_id: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let _: i64 = conn
            .xdel(stream, &[message_id])
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<BrokerHealth> {
        let mut conn = self.conn.lock().await;
        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let mut stream_depths = HashMap::new();
        for stream in STREAMS {
            let len: i64 = conn.xlen(stream).await.unwrap_or(0);
            stream_depths.insert(stream.to_string(), len as usize);
        }

        Ok(BrokerHealth {
            connected: pong == "PONG",
            stream_depths,
        })
    }
}
