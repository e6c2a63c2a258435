use std::sync::Arc;

use eatba_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use eatba_core::catalog::{Catalog, CatalogError, TomlDirectorySource};
use eatba_core::config::AppConfig;
use eatba_core::flows::DialogEngine;
use eatba_core::session::InMemorySessionStore;
use eatba_line::events::{dispatcher_for, EventDispatcher};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<InMemorySessionStore>,
    pub dispatcher: Arc<EventDispatcher>,
    pub audit_sink: Arc<dyn AuditSink>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog load failed: {0}")]
    Catalog(#[source] CatalogError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    bootstrap_with_sink(config, Arc::new(TracingAuditSink))
}

pub fn bootstrap_with_sink(
    config: AppConfig,
    audit_sink: Arc<dyn AuditSink>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        data_dir = %config.catalog.data_dir.display(),
        "starting application bootstrap"
    );

    let source = TomlDirectorySource::new(&config.catalog.data_dir);
    let catalog = Arc::new(Catalog::load(&source).map_err(BootstrapError::Catalog)?);
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        restaurants = catalog.item_count(),
        "restaurant catalog loaded"
    );

    let sessions = Arc::new(InMemorySessionStore::new(config.session.settings()));
    let mut engine = DialogEngine::new(Arc::clone(&catalog), Arc::clone(&sessions))
        .with_sampler(config.sampler.sampler())
        .with_audit_sink(Arc::clone(&audit_sink));
    if let Some(seed) = config.sampler.seed {
        engine = engine.with_seed(seed);
    }
    let dispatcher = Arc::new(dispatcher_for(Arc::new(engine)));

    info!(
        event_name = "system.bootstrap.completed",
        correlation_id = "bootstrap",
        handlers = dispatcher.handler_count(),
        line_credentials = config.line.is_configured(),
        "application bootstrap completed"
    );
    audit_sink.emit(
        AuditEvent::new(
            &AuditContext::new(None, "bootstrap", "eatba-server"),
            "system.bootstrap_completed",
            AuditCategory::System,
            AuditOutcome::Success,
        )
        .with_metadata("restaurants", catalog.item_count().to_string())
        .with_metadata("handlers", dispatcher.handler_count().to_string()),
    );

    Ok(Application { config, catalog, sessions, dispatcher, audit_sink })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use eatba_core::audit::{AuditCategory, InMemoryAuditSink};
    use eatba_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use eatba_core::domain::reply::ReplyPayload;
    use eatba_core::session::SessionStore;
    use eatba_line::events::{EventContext, HandlerResult, InboundEvent};
    use tempfile::TempDir;

    use crate::bootstrap::{bootstrap_with_sink, Application, BootstrapError};

    fn write_dataset(dir: &Path) {
        let datasets = [
            ("breakfast_rest.toml", "早安山丘", "中區"),
            ("lunch_rest.toml", "阿明師老店", "中區"),
            ("dinner_rest.toml", "金色三麥", "西屯區"),
        ];
        for (file, name, area) in datasets {
            fs::write(
                dir.join(file),
                format!(
                    "[[restaurants]]\nname = \"{name}\"\n\
                     opentime = \"11:00-21:00\"\narea = \"{area}\"\n"
                ),
            )
            .expect("write dataset");
        }
    }

    fn bootstrap(dir: &Path, sink: &InMemoryAuditSink) -> Result<Application, BootstrapError> {
        let options = LoadOptions {
            overrides: ConfigOverrides {
                data_dir: Some(dir.to_path_buf()),
                sampler_seed: Some(1),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        };
        let config = AppConfig::load(options).expect("config loads");
        bootstrap_with_sink(config, Arc::new(sink.clone()))
    }

    fn message(text: &str) -> InboundEvent {
        InboundEvent::Message { user_id: "U1".to_owned(), text: text.to_owned() }
    }

    #[tokio::test]
    async fn bootstrap_wires_catalog_sessions_dispatcher_and_audit() {
        let dir = TempDir::new().expect("tempdir");
        write_dataset(dir.path());
        let sink = InMemoryAuditSink::default();

        let app = bootstrap(dir.path(), &sink).expect("bootstrap should succeed");

        assert_eq!(app.catalog.item_count(), 3);
        assert_eq!(app.dispatcher.handler_count(), 3);

        let ctx = EventContext::new("req-1");
        app.dispatcher.dispatch(&message("#高檔晚餐"), &ctx).await.expect("dispatch");
        let picks = app.dispatcher.dispatch(&message("#西屯區"), &ctx).await.expect("dispatch");
        let HandlerResult::Responded(ReplyPayload::Carousel(carousel)) = picks else {
            panic!("expected a carousel");
        };
        assert_eq!(carousel.cards[0].title, "金色三麥");
        assert_eq!(app.sessions.len(), 1);

        let events = sink.events();
        let categories: Vec<_> = events.iter().map(|event| event.category.clone()).collect();
        assert_eq!(
            categories,
            vec![AuditCategory::System, AuditCategory::Dialog, AuditCategory::Dialog]
        );
        assert_eq!(events[0].event_type, "system.bootstrap_completed");
        assert_eq!(events[1].correlation_id, "req-1");
        assert_eq!(events[2].user_id.as_deref(), Some("U1"));
    }

    #[test]
    fn bootstrap_fails_fast_when_catalog_is_missing() {
        let dir = TempDir::new().expect("tempdir");
        let sink = InMemoryAuditSink::default();

        let result = bootstrap(&dir.path().join("absent"), &sink);

        let error = result.err().expect("missing data must stop startup");
        assert!(matches!(error, BootstrapError::Catalog(_)));
        assert!(error.to_string().contains("catalog load failed"));
        assert!(sink.events().is_empty());
    }
}
