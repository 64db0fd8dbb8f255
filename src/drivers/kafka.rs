use std::time::Duration;

use rdkafka::{
    config::ClientConfig,
    producer::{BaseProducer, BaseRecord, Producer},
    util::Timeout,
};

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, Severity},
};

/// Publishes each event to a Kafka topic, keyed by trace id.
pub struct KafkaDriver {
    level: Severity,
    producer: BaseProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaDriver {
    pub fn connect(
        level: Severity,
        brokers: &[String],
        topic: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let producer: BaseProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers.join(","))
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .create()
            .map_err(|err| ConfigurationError::unavailable("kafka", err))?;

        Ok(Self {
            level,
            producer,
            topic: topic.into(),
            timeout,
        })
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        let brokers = match settings.string_list("brokers")? {
            Some(brokers) => brokers,
            None => vec![settings.required_str("broker")?.to_string()],
        };

        Self::connect(
            settings.level()?,
            &brokers,
            settings.required_str("topic")?,
            settings.timeout()?,
        )
    }
}

impl Driver for KafkaDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        let payload = event.to_json()?;
        let record = BaseRecord::<str, String>::to(&self.topic).payload(&payload);
        let record = match event.trace_id() {
            Some(trace_id) => record.key(trace_id),
            None => record,
        };

        self.producer
            .send(record)
            .map_err(|(err, _)| DeliveryError::transport(err))?;
        self.producer
            .flush(Timeout::After(self.timeout))
            .map_err(DeliveryError::transport)
    }

    fn name(&self) -> &str {
        "kafka"
    }
}
