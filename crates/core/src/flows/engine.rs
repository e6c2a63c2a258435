use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::catalog::{AreaGrouping, Catalog};
use crate::domain::item::MealTime;
use crate::domain::reply::ReplyPayload;
use crate::errors::DialogError;
use crate::flows::replies;
use crate::flows::states::{DialogAction, DialogState, TransitionOutcome};
use crate::intent::{Intent, IntentRouter};
use crate::sampler::Sampler;
use crate::session::SessionStore;

/// Pure transition table. Side effects are described by the returned actions
/// and carried out by [`DialogEngine`].
pub fn transition(
    current: &DialogState,
    intent: &Intent,
) -> Result<TransitionOutcome, DialogError> {
    use DialogAction::{
        Acknowledge, PresentAreaMenu, PresentCategoryMenu, RememberCategory, ReplyDemo,
        SampleRecommendations,
    };
    use DialogState::{CategoryChosen, Idle};

    let (to, actions) = match (current, intent) {
        (_, Intent::ShowSamples(kind)) => (current.clone(), vec![ReplyDemo(*kind)]),
        (_, Intent::ShowCategoryMenu) => (current.clone(), vec![PresentCategoryMenu]),
        (_, Intent::ShowSubcategoryMenu(token)) => {
            let category = MealTime::from_selection_token(token)
                .ok_or_else(|| DialogError::UnknownCategoryToken { token: token.clone() })?;
            (CategoryChosen(category), vec![PresentAreaMenu(category), RememberCategory(category)])
        }
        (Idle, Intent::ShowRecommendations(_)) => return Err(DialogError::NoActiveSession),
        (CategoryChosen(category), Intent::ShowRecommendations(area)) => (
            current.clone(),
            vec![SampleRecommendations { category: *category, area: area.clone() }],
        ),
        (_, Intent::Fallback) => (current.clone(), vec![Acknowledge]),
    };

    Ok(TransitionOutcome { from: current.clone(), to, intent: intent.clone(), actions })
}

pub struct DialogEngine<S> {
    catalog: Arc<Catalog>,
    sessions: Arc<S>,
    router: IntentRouter,
    sampler: Sampler,
    rng: Mutex<StdRng>,
    audit_sink: Option<Arc<dyn AuditSink>>,
}

impl<S> DialogEngine<S>
where
    S: SessionStore,
{
    pub fn new(catalog: Arc<Catalog>, sessions: Arc<S>) -> Self {
        Self {
            catalog,
            sessions,
            router: IntentRouter::new(),
            sampler: Sampler::default(),
            rng: Mutex::new(StdRng::from_entropy()),
            audit_sink: None,
        }
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &Arc<S> {
        &self.sessions
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Current state without extending the session lifetime.
    pub fn state_of(&self, user_id: &str) -> DialogState {
        DialogState::from_session(self.sessions.peek(user_id))
    }

    pub fn respond(&self, user_id: &str, text: &str, context: &AuditContext) -> ReplyPayload {
        let (intent, rule) = self.router.classify_with_rule(text);
        tracing::debug!(
            event_name = "dialog.intent.classified",
            correlation_id = %context.correlation_id,
            user_id,
            intent = intent.name(),
            rule,
            "classified inbound text"
        );
        self.handle(user_id, &intent, context)
    }

    /// Runs one dialog turn. Never fails: recoverable errors degrade to a reply.
    pub fn handle(&self, user_id: &str, intent: &Intent, context: &AuditContext) -> ReplyPayload {
        match self.try_handle(user_id, intent) {
            Ok((outcome, reply)) => {
                info!(
                    event_name = "dialog.turn.handled",
                    correlation_id = %context.correlation_id,
                    user_id,
                    intent = intent.name(),
                    from = ?outcome.from,
                    to = ?outcome.to,
                    reply_kind = reply.kind(),
                    "dialog turn handled"
                );
                self.audit(
                    AuditEvent::new(
                        context,
                        "dialog.transition_applied",
                        AuditCategory::Dialog,
                        AuditOutcome::Success,
                    )
                    .with_metadata("intent", intent.name())
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("reply_kind", reply.kind()),
                );
                reply
            }
            Err(error) => {
                warn!(
                    event_name = "dialog.turn.degraded",
                    correlation_id = %context.correlation_id,
                    user_id,
                    intent = intent.name(),
                    error_kind = error.kind(),
                    error = %error,
                    "dialog turn degraded to fallback reply"
                );
                self.audit(
                    AuditEvent::new(
                        context,
                        "dialog.transition_rejected",
                        AuditCategory::Dialog,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("intent", intent.name())
                    .with_metadata("error_kind", error.kind())
                    .with_metadata("error", error.to_string()),
                );
                error.fallback_reply()
            }
        }
    }

    fn try_handle(
        &self,
        user_id: &str,
        intent: &Intent,
    ) -> Result<(TransitionOutcome, ReplyPayload), DialogError> {
        // Only picking an area counts as activity on the session.
        let selection = match intent {
            Intent::ShowRecommendations(_) => self.sessions.get(user_id),
            _ => self.sessions.peek(user_id),
        };
        let outcome = transition(&DialogState::from_session(selection), intent)?;

        let mut reply = None;
        for action in &outcome.actions {
            match action {
                DialogAction::ReplyDemo(kind) => reply = Some(replies::demo(*kind)),
                DialogAction::PresentCategoryMenu => reply = Some(replies::category_menu()),
                DialogAction::PresentAreaMenu(category) => {
                    reply = Some(replies::area_menu(self.groups_of(*category)?));
                }
                DialogAction::RememberCategory(category) => self.sessions.set(user_id, *category),
                DialogAction::SampleRecommendations { category, area } => {
                    let grouping = self.groups_of(*category)?;
                    let picks = {
                        let mut rng = self.rng();
                        self.sampler.sample(grouping, *category, area, &mut *rng)?
                    };
                    reply = Some(self.sampler.carousel(&picks));
                }
                DialogAction::Acknowledge => reply = Some(replies::fallback()),
            }
        }

        Ok((outcome, reply.unwrap_or_else(replies::fallback)))
    }

    fn groups_of(&self, category: MealTime) -> Result<&AreaGrouping, DialogError> {
        self.catalog
            .groups_of(category)
            .map_err(|_| DialogError::CategoryNotLoaded { category })
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn audit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit_sink {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{transition, DialogEngine};
    use crate::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use crate::catalog::Catalog;
    use crate::domain::item::{Item, MealTime};
    use crate::domain::reply::ReplyPayload;
    use crate::errors::DialogError;
    use crate::fixtures;
    use crate::flows::replies;
    use crate::flows::states::{DialogAction, DialogState};
    use crate::intent::{DemoKind, Intent};
    use crate::session::{InMemorySessionStore, SessionSettings, SessionStore};

    fn engine() -> DialogEngine<InMemorySessionStore> {
        let catalog = Catalog::load(&fixtures::demo_source()).expect("fixture catalog loads");
        let sessions = InMemorySessionStore::new(SessionSettings::default());
        DialogEngine::new(Arc::new(catalog), Arc::new(sessions)).with_seed(42)
    }

    fn context() -> AuditContext {
        AuditContext::new(Some("U1".to_owned()), "req-1", "test")
    }

    #[test]
    fn transition_table_covers_every_intent() {
        let breakfast = DialogState::CategoryChosen(MealTime::Breakfast);

        let demo = transition(&DialogState::Idle, &Intent::ShowSamples(DemoKind::Confirm))
            .expect("demo");
        assert_eq!(demo.to, DialogState::Idle);
        assert_eq!(demo.actions, vec![DialogAction::ReplyDemo(DemoKind::Confirm)]);

        let menu = transition(&breakfast, &Intent::ShowCategoryMenu).expect("menu");
        assert_eq!(menu.to, breakfast);

        let choose = transition(&breakfast, &Intent::ShowSubcategoryMenu("#高檔晚餐".to_owned()))
            .expect("choose");
        assert_eq!(choose.to, DialogState::CategoryChosen(MealTime::Dinner));
        assert_eq!(
            choose.actions,
            vec![
                DialogAction::PresentAreaMenu(MealTime::Dinner),
                DialogAction::RememberCategory(MealTime::Dinner)
            ]
        );

        let recommend = transition(&breakfast, &Intent::ShowRecommendations("中區".to_owned()))
            .expect("recommend");
        assert_eq!(recommend.to, breakfast, "recommendations do not reset the session");

        let fallback = transition(&DialogState::Idle, &Intent::Fallback).expect("fallback");
        assert_eq!(fallback.actions, vec![DialogAction::Acknowledge]);
    }

    #[test]
    fn transition_rejects_unknown_token_and_missing_session() {
        assert_eq!(
            transition(&DialogState::Idle, &Intent::ShowSubcategoryMenu("#宵夜餐".to_owned())),
            Err(DialogError::UnknownCategoryToken { token: "#宵夜餐".to_owned() })
        );
        assert_eq!(
            transition(&DialogState::Idle, &Intent::ShowRecommendations("中區".to_owned())),
            Err(DialogError::NoActiveSession)
        );
    }

    #[test]
    fn recommend_trigger_presents_three_meal_buttons() {
        let engine = engine();
        let ReplyPayload::ButtonMenu(menu) = engine.respond("U1", "美食推薦", &context()) else {
            panic!("expected a button menu");
        };
        assert_eq!(menu.options.len(), 3);
        assert_eq!(menu.title, "歡迎使用!!");
        assert_eq!(menu.options[0].payload, "#文青早餐");
    }

    #[test]
    fn meal_selection_presents_areas_and_remembers_choice() {
        let engine = engine();
        let ReplyPayload::QuickReplyMenu(menu) = engine.respond("U1", "#文青早餐", &context()) else {
            panic!("expected a quick reply menu");
        };
        let labels: Vec<_> = menu.options.iter().map(|option| option.label.as_str()).collect();
        assert_eq!(labels, vec!["中區", "北區", "西區"]);
        assert_eq!(menu.options[2].payload, "#西區");
        assert_eq!(engine.sessions().get("U1"), Some(MealTime::Breakfast));
        assert_eq!(engine.state_of("U1"), DialogState::CategoryChosen(MealTime::Breakfast));
    }

    #[test]
    fn area_selection_samples_from_the_remembered_meal_time() {
        let engine = engine();
        engine.respond("U1", "#文青早餐", &context());

        let ReplyPayload::Carousel(carousel) = engine.respond("U1", "#中區", &context()) else {
            panic!("expected a carousel");
        };
        assert_eq!(carousel.cards.len(), 3);
        let central: Vec<_> = fixtures::demo_items()
            .into_iter()
            .filter(|item| item.category == MealTime::Breakfast && item.subcategory == "中區")
            .map(|item| item.name)
            .collect();
        assert!(carousel.cards.iter().all(|card| central.contains(&card.title)));

        // The session survives, so another area can be picked right away.
        assert!(matches!(engine.respond("U1", "#北區", &context()), ReplyPayload::Carousel(_)));
        assert_eq!(engine.sessions().get("U1"), Some(MealTime::Breakfast));
    }

    #[test]
    fn unmatched_text_is_acknowledged() {
        assert_eq!(engine().respond("U1", "hello", &context()), replies::fallback());
    }

    #[test]
    fn category_menu_never_touches_sessions() {
        let engine = engine();
        for _ in 0..3 {
            engine.respond("U1", "美食推薦", &context());
        }
        assert!(engine.sessions().is_empty());

        engine.respond("U1", "#在地午餐", &context());
        engine.respond("U1", "美食推薦", &context());
        assert_eq!(engine.sessions().get("U1"), Some(MealTime::Lunch));
    }

    #[test]
    fn area_without_session_asks_to_restart() {
        let engine = engine();
        assert_eq!(engine.respond("U9", "#中區", &context()), replies::restart_prompt());
        assert!(engine.sessions().is_empty());
    }

    #[test]
    fn unknown_meal_token_leaves_session_untouched() {
        let engine = engine();
        engine.respond("U1", "#高檔晚餐", &context());

        assert_eq!(engine.respond("U1", "#宵夜餐", &context()), replies::fallback());
        assert_eq!(engine.sessions().get("U1"), Some(MealTime::Dinner));
    }

    #[test]
    fn area_missing_for_the_chosen_meal_time_names_the_area() {
        let engine = engine();
        engine.respond("U1", "#高檔晚餐", &context());

        assert_eq!(engine.respond("U1", "#北區", &context()), replies::unknown_area("北區"));
    }

    #[test]
    fn users_keep_independent_selections() {
        let engine = engine();
        engine.respond("U1", "#文青早餐", &context());
        engine.respond("U2", "#高檔晚餐", &context());

        assert_eq!(engine.sessions().get("U1"), Some(MealTime::Breakfast));
        assert_eq!(engine.sessions().get("U2"), Some(MealTime::Dinner));
    }

    #[test]
    fn meal_time_missing_from_a_hand_built_catalog_falls_back() {
        let item = Item::new("早安山丘", "07:00-14:00", MealTime::Breakfast, "中區");
        let catalog = Catalog::from_items(vec![item]);
        let engine =
            DialogEngine::new(Arc::new(catalog), Arc::new(InMemorySessionStore::default()));

        assert_eq!(engine.respond("U1", "#在地午餐", &context()), replies::fallback());
        assert!(engine.sessions().is_empty());
    }

    #[test]
    fn every_turn_is_audited() {
        let sink = InMemoryAuditSink::default();
        let engine = engine().with_audit_sink(Arc::new(sink.clone()));

        engine.respond("U1", "#文青早餐", &context());
        engine.respond("U2", "#中區", &context());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].outcome, AuditOutcome::Success);
        assert_eq!(
            events[0].metadata.get("to").map(String::as_str),
            Some("CategoryChosen(Breakfast)")
        );
        assert_eq!(events[1].outcome, AuditOutcome::Rejected);
        assert_eq!(
            events[1].metadata.get("error_kind").map(String::as_str),
            Some("no_active_session")
        );
    }

    #[test]
    fn demo_requests_reply_with_canned_payloads() {
        let engine = engine();
        let confirm = engine.respond("U1", "確認sample", &context());
        assert!(matches!(confirm, ReplyPayload::Confirm(_)));
        let menu = engine.respond("U1", "sample", &context());
        assert!(matches!(menu, ReplyPayload::QuickReplyMenu(_)));
    }
}
