// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The per-datagram processing pipeline.
//!
//! One [`Pipeline`] is built at startup and shared by every worker; it owns
//! the filter, the optional augmentation hook, the delta tracker and the
//! observer registry. There is no other process-wide state.

use std::time::Duration;

use crate::augment::{Augment, SiteAugmenter};
use crate::config::Config;
use crate::decoder;
use crate::delta::DeltaTracker;
use crate::errors::{ConfigError, PipelineError};
use crate::filter::FieldFilter;
use crate::observer::ObserverRegistry;

pub struct Pipeline {
    filter: FieldFilter,
    augmenter: Option<Box<dyn Augment>>,
    deltas: Option<DeltaTracker>,
    registry: ObserverRegistry,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        filter: FieldFilter,
        augmenter: Option<Box<dyn Augment>>,
        deltas: Option<DeltaTracker>,
        registry: ObserverRegistry,
    ) -> Self {
        Pipeline {
            filter,
            augmenter,
            deltas,
            registry,
        }
    }

    /// Wire a pipeline from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let filter = FieldFilter::new(&config.include_fields, &config.exclude_fields)?;
        let augmenter: Option<Box<dyn Augment>> = if config.site_rules.is_empty() {
            None
        } else {
            Some(Box::new(SiteAugmenter::new(config.site_rules.clone())))
        };
        let deltas = config.deltas.then(|| {
            DeltaTracker::new(config.source_stale_after_secs.map(Duration::from_secs))
        });
        let registry = ObserverRegistry::from_sections(&config.observers)?;
        Ok(Pipeline::new(filter, augmenter, deltas, registry))
    }

    /// Run one report payload through decode, filter, augmentation, delta
    /// computation and dispatch.
    ///
    /// An error aborts this payload only; shared state beyond the delta
    /// baseline is never touched.
    pub async fn process(&self, payload: &str) -> Result<(), PipelineError> {
        let record = decoder::decode(payload)?;
        let record = self.filter.apply(&record);
        let record = match &self.augmenter {
            Some(augmenter) => augmenter.augment(&record),
            None => record,
        };
        let record = match &self.deltas {
            Some(tracker) => tracker.compute(&record)?,
            None => record,
        };
        self.registry.dispatch(&record).await;
        Ok(())
    }

    #[must_use]
    pub fn observers(&self) -> &ObserverRegistry {
        &self.registry
    }

    /// Delta tracker handle, when rate computation is enabled.
    #[must_use]
    pub fn delta_tracker(&self) -> Option<&DeltaTracker> {
        self.deltas.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::CapturingObserver;
    use crate::record::Value;

    const REPORT_ONE: &str = concat!(
        r#"<statistics tod="100" ver="v5.4.3" src="a.example.org:1094" pgm="xrootd" "#,
        r#"ins="anon" pid="901" site="EXAMPLE">"#,
        r#"<stats id="link"><num>5</num></stats>"#,
        r#"</statistics>"#
    );
    const REPORT_TWO: &str = concat!(
        r#"<statistics tod="110" ver="v5.4.3" src="a.example.org:1094" pgm="xrootd" "#,
        r#"ins="anon" pid="901" site="EXAMPLE">"#,
        r#"<stats id="link"><num>15</num></stats>"#,
        r#"</statistics>"#
    );

    fn pipeline_with_capture(config: &Config) -> (Pipeline, std::sync::Arc<std::sync::Mutex<Vec<crate::record::Record>>>) {
        let (observer, served) = CapturingObserver::new();
        let filter = FieldFilter::new(&config.include_fields, &config.exclude_fields).unwrap();
        let deltas = config.deltas.then(|| DeltaTracker::new(None));
        let pipeline = Pipeline::new(
            filter,
            None,
            deltas,
            ObserverRegistry::new(vec![Box::new(observer)]),
        );
        (pipeline, served)
    }

    #[tokio::test]
    async fn test_deltas_flow_across_reports() {
        let config = Config {
            deltas: true,
            ..Config::default()
        };
        let (pipeline, served) = pipeline_with_capture(&config);

        pipeline.process(REPORT_ONE).await.unwrap();
        pipeline.process(REPORT_TWO).await.unwrap();

        let served = served.lock().unwrap();
        assert_eq!(served.len(), 2);
        assert!(!served[0].contains_key("delta_s"));
        assert_eq!(served[1]["delta_s"], Value::Float(10.0));
        assert_eq!(served[1]["delta_link__num"], Value::Float(1.0));
    }

    #[tokio::test]
    async fn test_filter_runs_before_dispatch() {
        let config = Config {
            exclude_fields: "link".to_string(),
            ..Config::default()
        };
        let (pipeline, served) = pipeline_with_capture(&config);

        pipeline.process(REPORT_ONE).await.unwrap();

        let served = served.lock().unwrap();
        assert!(!served[0].contains_key("link__num"));
        assert!(served[0].contains_key("src"));
    }

    #[tokio::test]
    async fn test_decode_failure_reaches_no_observer() {
        let (pipeline, served) = pipeline_with_capture(&Config::default());
        assert!(pipeline.process("not xml at all").await.is_err());
        assert!(served.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_augmentation_applies_configured_rules() {
        let config = Config {
            site_rules: vec![crate::augment::SiteRule {
                field: "src".to_string(),
                contains: Some("a.example.org".to_string()),
                equals: None,
                set: [("host_type".to_string(), "disk".to_string())]
                    .into_iter()
                    .collect(),
            }],
            ..Config::default()
        };
        let (observer, served) = CapturingObserver::new();
        let mut pipeline = Pipeline::from_config(&config).unwrap();
        pipeline.registry = ObserverRegistry::new(vec![Box::new(observer)]);

        pipeline.process(REPORT_ONE).await.unwrap();

        let served = served.lock().unwrap();
        assert_eq!(served[0]["host_type"], Value::Str("disk".to_string()));
    }
}
