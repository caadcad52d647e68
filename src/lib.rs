//! Solfa - Ear-Training Quiz Engine
//!
//! Solfa runs turn-based ear-training sessions. It picks unseen practice
//! items (intervals, chords, cadences) from a content pool, poses one
//! question per turn, scores the answers, and renders every turn as two
//! parallel strings: a display text and a speech text with embedded audio
//! cue markers for a TTS host.
//!
//! # Architecture
//!
//! - Content: an immutable [`content::ContentStore`] snapshot plus a
//!   mutable anti-repeat [`content::Sampler`] over it
//! - Levels: each activity behind the [`levels::LevelOps`] trait, handed a
//!   [`levels::Shared`] context per call
//! - Engine: one [`engine::Engine`] per session drives the mode state
//!   machine and folds level output into [`reply::Reply`] values
//! - Sessions: [`session::SessionRegistry`] maps session ids to engines
//!   behind per-session mutexes, pruning idle entries

pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod input;
pub mod levels;
pub mod phrases;
pub mod reply;
pub mod session;

pub use config::Config;
pub use engine::{Engine, Mode};
pub use error::{Result, SolfaError};
pub use input::{Button, ButtonAction, UserInput};
pub use reply::{AudioTagResolver, NullResolver, Reply, TemplateResolver};
pub use session::SessionRegistry;
