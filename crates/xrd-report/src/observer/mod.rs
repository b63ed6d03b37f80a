// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Observers: the pluggable consumers a finalized record is fanned out to.
//!
//! The set of observer kinds is closed — each configuration section carries a
//! type tag that [`ObserverRegistry::from_sections`] maps onto a constructor.
//! Observers are built once at startup and never change while serving.
//! Dispatch calls arrive from concurrently running pipeline invocations, so
//! every implementation is responsible for its own thread safety.

pub mod elastic;
pub mod file;
pub mod influx;
pub mod logger;
pub mod summary;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::config::{ObserverKind, ObserverSection};
use crate::errors::{ConfigError, SinkError};
use crate::record::Record;

pub use elastic::ElasticSearchObserver;
pub use file::FileObserver;
pub use influx::InfluxDbObserver;
pub use logger::LoggerObserver;
pub use summary::SummaryLoggerObserver;

/// A sink for finalized records.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Consume one record. Failures are scoped to this observer; the
    /// dispatcher logs them and moves on.
    async fn serve(&self, record: &Record) -> Result<(), SinkError>;

    /// Short description for startup logs.
    fn describe(&self) -> String;
}

/// Ordered list of live observers, built once at startup.
pub struct ObserverRegistry {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new(observers: Vec<Box<dyn Observer>>) -> Self {
        ObserverRegistry { observers }
    }

    /// Materialize configured observer sections into live instances.
    ///
    /// Disabled sections are skipped with a hint; the section's type tag
    /// selects the constructor.
    pub fn from_sections(
        sections: &IndexMap<String, ObserverSection>,
    ) -> Result<Self, ConfigError> {
        let mut observers: Vec<Box<dyn Observer>> = Vec::new();
        for (name, section) in sections {
            if !section.enabled {
                info!("observer {name} is disabled; set 'enabled: true' to activate it");
                continue;
            }
            let observer: Box<dyn Observer> = match &section.observer {
                ObserverKind::Logger { level } => Box::new(LoggerObserver::new(*level)),
                ObserverKind::SummaryLogger { level, fields } => {
                    Box::new(SummaryLoggerObserver::new(*level, fields.clone()))
                }
                ObserverKind::File { filename } => Box::new(FileObserver::new(filename.clone())),
                ObserverKind::ElasticSearch { hosts, type_name } => Box::new(
                    ElasticSearchObserver::new(hosts.clone(), type_name.clone())?,
                ),
                ObserverKind::InfluxDb { measurement, api } => {
                    Box::new(InfluxDbObserver::new(measurement.clone(), api.clone())?)
                }
            };
            debug!("observer {name} configured: {}", observer.describe());
            observers.push(observer);
        }
        Ok(ObserverRegistry::new(observers))
    }

    /// Fan one record out to every observer, in registration order.
    ///
    /// A failing observer never stops the remaining ones.
    pub async fn dispatch(&self, record: &Record) {
        for observer in &self.observers {
            if let Err(err) = observer.serve(record).await {
                error!("observer {} failed to serve record: {err}", observer.describe());
            }
        }
    }

    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.observers.iter().map(|o| o.describe()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{CapturingObserver, FailingObserver};
    use super::*;
    use crate::record::Value;

    fn sample() -> Record {
        let mut record = Record::new();
        record.insert("src".to_string(), Value::Str("a:1".to_string()));
        record
    }

    #[tokio::test]
    async fn test_failing_observer_does_not_block_the_rest() {
        let (first, first_served) = CapturingObserver::new();
        let (last, last_served) = CapturingObserver::new();
        let registry = ObserverRegistry::new(vec![
            Box::new(first),
            Box::new(FailingObserver),
            Box::new(last),
        ]);

        registry.dispatch(&sample()).await;
        registry.dispatch(&sample()).await;

        assert_eq!(first_served.lock().unwrap().len(), 2);
        assert_eq!(last_served.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_runs_in_registration_order() {
        use std::sync::{Arc, Mutex};

        struct OrderObserver {
            name: &'static str,
            order: Arc<Mutex<Vec<&'static str>>>,
        }

        #[async_trait]
        impl Observer for OrderObserver {
            async fn serve(&self, _record: &Record) -> Result<(), SinkError> {
                self.order.lock().unwrap().push(self.name);
                Ok(())
            }
            fn describe(&self) -> String {
                self.name.to_string()
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let registry = ObserverRegistry::new(vec![
            Box::new(OrderObserver {
                name: "one",
                order: Arc::clone(&order),
            }),
            Box::new(OrderObserver {
                name: "two",
                order: Arc::clone(&order),
            }),
        ]);

        registry.dispatch(&sample()).await;
        assert_eq!(*order.lock().unwrap(), vec!["one", "two"]);
    }
}
