//! Mention-aware prompt composer.
//!
//! Free text and atomic mention chips live in a [`tree::DocumentTree`]; the
//! portable form encodes every chip as `@[<id>]`. A [`Composer`] keeps both
//! views in sync and reports `@` and `/` triggers to its [`ComposerHost`].

pub mod build;
pub mod composer;
pub mod edit;
pub mod host;
pub mod layout;
pub mod mention;
pub mod serialize;
pub mod tree;
pub mod trigger;
pub mod walker;

pub use build::{MentionResolver, StructuralResolver, build};
pub use composer::{Composer, ComposerConfig, KeyInput, KeyOutcome};
pub use host::{CaretRect, ComposerHost, TriggerEvent};
pub use mention::{FileMentionOption, MentionChip, MentionId, MentionIdError, MentionKind};
pub use serialize::serialize;
pub use trigger::{TriggerKind, TriggerState};
