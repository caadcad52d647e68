//! Dual-channel reply formatting
//!
//! Every turn is rendered twice from the same ordered fragment list: once
//! for the display channel and once for the speech channel. The folds are
//! independent. Audio fragments contribute only to speech, where they
//! resolve through an injected [`AudioTagResolver`] into an inline cue
//! marker.
//!
//! A separator goes between consecutive non-empty emissions, except after a
//! newline-terminated emission, before an emission whose first character is
//! not alphanumeric, and next to a resolved audio tag. The fold carries two
//! flags across fragments to implement this.

use std::sync::Arc;

use crate::content::ContentItem;

/// Default separator between joined fragments.
pub const DEFAULT_SEP: &str = " ";

/// One turn's output: parallel display and speech strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub display: String,
    pub speech: String,
}

impl Reply {
    pub fn new(display: impl Into<String>, speech: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            speech: speech.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display.is_empty() && self.speech.is_empty()
    }
}

/// Resolves an audio-asset key into an inline cue marker for the speech
/// channel. `None` means "no audio available" and degrades to text-only
/// output, not an error.
pub trait AudioTagResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Resolver that never finds audio. Text-only speech output.
#[derive(Debug, Default)]
pub struct NullResolver;

impl AudioTagResolver for NullResolver {
    fn resolve(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Resolver substituting the asset key into a marker template, e.g.
/// `<audio src="{key}.opus">`.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    template: String,
}

impl TemplateResolver {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl AudioTagResolver for TemplateResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        Some(self.template.replace("{key}", key))
    }
}

/// One heterogeneous reply fragment. Groups flatten recursively in order.
#[derive(Debug, Clone)]
pub enum Fragment {
    Text(String),
    /// Audio-asset key; speech-channel only.
    Audio(String),
    Group(Vec<Fragment>),
}

impl Fragment {
    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text(value.into())
    }

    /// Empty fragment; contributes nothing to either channel.
    pub fn none() -> Self {
        Fragment::Text(String::new())
    }

    /// `None` becomes an empty fragment and is skipped by both folds.
    pub fn opt(value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => Fragment::Text(v.into()),
            None => Fragment::none(),
        }
    }

    /// Audio cue for a content item as voiced.
    pub fn audio_for(item: &Arc<ContentItem>) -> Self {
        Fragment::Audio(item.file_key())
    }
}

impl From<&str> for Fragment {
    fn from(value: &str) -> Self {
        Fragment::Text(value.to_string())
    }
}

impl From<String> for Fragment {
    fn from(value: String) -> Self {
        Fragment::Text(value)
    }
}

/// Fold state threaded across fragments, including through nested groups.
#[derive(Default, Clone, Copy)]
struct JoinState {
    newline: bool,
    prev_tag: bool,
}

/// Format the display channel with the default separator.
pub fn format_display(fragments: &[Fragment]) -> String {
    format_display_sep(fragments, DEFAULT_SEP)
}

pub fn format_display_sep(fragments: &[Fragment], sep: &str) -> String {
    let mut out = String::new();
    let mut state = JoinState::default();
    fold(&mut out, &mut state, fragments, sep, None);
    out
}

/// Format the speech channel with the default separator.
pub fn format_speech(fragments: &[Fragment], resolver: &dyn AudioTagResolver) -> String {
    format_speech_sep(fragments, resolver, DEFAULT_SEP)
}

pub fn format_speech_sep(
    fragments: &[Fragment],
    resolver: &dyn AudioTagResolver,
    sep: &str,
) -> String {
    let mut out = String::new();
    let mut state = JoinState::default();
    fold(&mut out, &mut state, fragments, sep, Some(resolver));
    out
}

fn fold(
    out: &mut String,
    state: &mut JoinState,
    fragments: &[Fragment],
    sep: &str,
    resolver: Option<&dyn AudioTagResolver>,
) {
    for fragment in fragments {
        let (value, tag) = match fragment {
            Fragment::Text(s) => (s.clone(), false),
            Fragment::Audio(key) => match resolver.and_then(|r| r.resolve(key)) {
                Some(marker) => (marker, true),
                // Display channel, or no audio available: skip.
                None => continue,
            },
            Fragment::Group(inner) => {
                fold(out, state, inner, sep, resolver);
                continue;
            }
        };

        if value.is_empty() {
            continue;
        }

        let first_alnum = value.chars().next().is_some_and(|c| c.is_alphanumeric());
        if !state.newline && !state.prev_tag && !tag && !sep.is_empty() && !out.is_empty() && first_alnum
        {
            out.push_str(sep);
        }

        out.push_str(&value);
        if !tag {
            state.newline = value.ends_with('\n');
        }
        state.prev_tag = tag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FakeResolver;

    impl AudioTagResolver for FakeResolver {
        fn resolve(&self, key: &str) -> Option<String> {
            if key == "missing" {
                None
            } else {
                Some(format!("<audio:{key}>"))
            }
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(format_display(&[]), "");
        assert_eq!(
            format_display(&[Fragment::none(), Fragment::opt(None::<String>)]),
            ""
        );
    }

    #[test]
    fn two_texts_get_one_separator() {
        let out = format_display(&[Fragment::text("Right!"), Fragment::text("Next one.")]);
        assert_eq!(out, "Right! Next one.");
    }

    #[test]
    fn no_separator_before_punctuation() {
        let out = format_display(&[Fragment::text("Level"), Fragment::text("\u{2014} done")]);
        assert_eq!(out, "Level\u{2014} done");
    }

    #[test]
    fn no_separator_after_newline() {
        let out = format_display(&[Fragment::text("line one\n"), Fragment::text("line two")]);
        assert_eq!(out, "line one\nline two");
    }

    #[test]
    fn groups_flatten_in_order() {
        let out = format_display(&[
            Fragment::text("a"),
            Fragment::Group(vec![Fragment::text("b"), Fragment::text("c")]),
            Fragment::text("d"),
        ]);
        assert_eq!(out, "a b c d");
    }

    #[test]
    fn audio_is_speech_only_and_unseparated() {
        let frags = [
            Fragment::text("Listen:"),
            Fragment::Audio("c4_e4".into()),
            Fragment::text("now answer"),
        ];
        assert_eq!(format_display(&frags), "Listen: now answer");
        assert_eq!(
            format_speech(&frags, &FakeResolver),
            "Listen:<audio:c4_e4>now answer"
        );
    }

    #[test]
    fn unresolved_audio_degrades_to_text_only() {
        let frags = [Fragment::text("a"), Fragment::Audio("missing".into()), Fragment::text("b")];
        assert_eq!(format_speech(&frags, &FakeResolver), "a b");
    }

    #[test]
    fn custom_separator() {
        let out = format_display_sep(
            &[Fragment::text("one"), Fragment::text("two"), Fragment::none()],
            "\n",
        );
        assert_eq!(out, "one\ntwo");
    }

    #[test]
    fn null_resolver_drops_all_audio() {
        let frags = [Fragment::Audio("c4".into())];
        assert_eq!(format_speech(&frags, &NullResolver), "");
    }

    #[test]
    fn template_resolver_substitutes_key() {
        let r = TemplateResolver::new("<sound id=\"{key}\">");
        assert_eq!(r.resolve("c4_ver").unwrap(), "<sound id=\"c4_ver\">");
        assert!(r.resolve("").is_none());
    }
}
