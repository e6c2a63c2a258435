//! LINE Messaging API adapter for the eatba dialog.
//!
//! - **Events** (`events`) - verified inbound events, dispatch, follow and postback handling
//! - **Messages** (`messages`) - `ReplyPayload` to LINE message objects, with field limits
//! - **Postback** (`postback`) - `action=<kind>&info=<value>` card action data
//!
//! ```text
//! InboundEvent → EventDispatcher → DialogEngine → ReplyPayload → messages::render
//! ```

pub mod events;
pub mod messages;
pub mod postback;

pub use events::{
    dispatcher_for, ConversationService, DispatchError, EventContext, EventDispatcher,
    EventHandler, EventHandlerError, EventType, HandlerResult, InboundEvent,
};
pub use messages::{render, LineMessage};
