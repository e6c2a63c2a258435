use std::sync::Arc;

use eatba_core::audit::{AuditContext, AuditEvent, InMemoryAuditSink};
use eatba_core::catalog::{Catalog, TomlDirectorySource};
use eatba_core::config::{AppConfig, LoadOptions};
use eatba_core::domain::reply::ReplyPayload;
use eatba_core::flows::DialogEngine;
use eatba_core::intent::IntentRouter;
use eatba_core::session::InMemorySessionStore;
use eatba_line::messages::{render, LineMessage};
use serde::Serialize;
use uuid::Uuid;

use super::{CommandResult, EXIT_CATALOG, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct Turn<'a> {
    text: &'a str,
    intent: &'static str,
    reply: ReplyPayload,
    line: LineMessage,
    audit: Option<AuditEvent>,
}

/// Replays `messages` as one user against a fresh in-memory session store.
/// Each turn carries the audit event the engine recorded for it.
pub fn run(user_id: &str, seed: Option<u64>, messages: &[String]) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let message = error.to_string();
            return CommandResult::failure("chat", "config_validation", message, EXIT_CONFIG);
        }
    };

    let catalog = match Catalog::load(&TomlDirectorySource::new(&config.catalog.data_dir)) {
        Ok(catalog) => catalog,
        Err(error) => {
            let message = error.to_string();
            return CommandResult::failure("chat", "catalog_load", message, EXIT_CATALOG);
        }
    };

    let sessions = Arc::new(InMemorySessionStore::new(config.session.settings()));
    let audit = InMemoryAuditSink::default();
    let mut engine = DialogEngine::new(Arc::new(catalog), sessions)
        .with_sampler(config.sampler.sampler())
        .with_audit_sink(Arc::new(audit.clone()));
    if let Some(seed) = seed.or(config.sampler.seed) {
        engine = engine.with_seed(seed);
    }

    let router = IntentRouter::new();
    let context =
        AuditContext::new(Some(user_id.to_owned()), Uuid::new_v4().to_string(), "eatba-cli");
    let turns: Vec<Turn<'_>> = messages
        .iter()
        .map(|text| {
            let reply = engine.respond(user_id, text, &context);
            Turn {
                text,
                intent: router.classify(text).name(),
                line: render(&reply),
                reply,
                audit: audit.events().pop(),
            }
        })
        .collect();

    CommandResult::success_with_data(
        "chat",
        format!("{} turn(s) replayed for `{user_id}`", turns.len()),
        serde_json::to_value(&turns).ok(),
    )
}
