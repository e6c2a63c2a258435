pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod flows;
pub mod intent;
pub mod sampler;
pub mod session;

pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
    TracingAuditSink,
};
pub use catalog::{
    AreaGroup, AreaGrouping, Catalog, CatalogError, CatalogSource, StaticCatalogSource,
    TomlDirectorySource,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::item::{Item, MealTime};
pub use domain::reply::{
    ButtonMenu, Carousel, CarouselCard, ConfirmPrompt, DetailAction, DetailKind, MenuOption,
    QuickReplyMenu, ReplyPayload,
};
pub use errors::DialogError;
pub use flows::{transition, DialogAction, DialogEngine, DialogState, TransitionOutcome};
pub use intent::{DemoKind, Intent, IntentRouter};
pub use sampler::Sampler;
pub use session::{
    Clock, InMemorySessionStore, ManualClock, SessionSettings, SessionStore, SystemClock,
};
