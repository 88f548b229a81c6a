pub mod broker;
pub mod error;
pub mod redis_broker;

pub use broker::{Broker, BrokerHealth, Delivery, InMemoryBroker};
pub use error::BrokerError;
pub use redis_broker::RedisBroker;
