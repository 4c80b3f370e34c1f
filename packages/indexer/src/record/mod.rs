//! Record model: field getters over one transformed LIDO unit.
//!
//! Every source variant implements [`RecordModel`]. Shared behavior lives in
//! [`LidoRecord`], which variants hold and delegate to through
//! [`RecordModel::base`]; a variant only overrides what differs for its
//! source (language, institution lookup, constants).

mod extract;
mod lido;
mod resolver;
mod variants;

use std::sync::LazyLock;

use regex::Regex;

use crate::daterange::{DateRangeResolver, DateSpan};
use crate::error::Result;
use crate::normalize::{
    create_sortable_string, normalize_unicode, split_title, strip_leading_article,
    strip_leading_punctuation, strip_trailing_punctuation, unique_preserving_order,
    NormalizeConfig,
};

pub use extract::base_document;
pub use lido::LidoRecord;
pub use resolver::{create_default_resolver, RecordConstructor, RecordResolver};
pub use variants::{DaphneLidoRecord, Source102LidoRecord};

/// Record type reported by every LIDO variant.
pub const RECORD_TYPE: &str = "lido";

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static GND_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://d-nb\.info/gnd/(.*)$").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISIL_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^info:isil/(.*)$").expect("valid regex"));

/// Settings shared by every record of a run.
#[derive(Debug, Clone, Default)]
pub struct RecordSettings {
    pub normalize: NormalizeConfig,
    pub dates: DateRangeResolver,
}

/// A person or entity attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub display_label: String,
    pub name: String,
    pub role: String,
    pub external_id: String,
}

/// Authority schemes understood by [`filter_actor_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorIdScheme {
    Gnd,
}

/// Reduce an actor id to the bare identifier of its authority scheme.
///
/// Text that does not match the scheme passes through unchanged.
///
/// # Examples
/// ```
/// use lido_indexer::record::{filter_actor_id, ActorIdScheme};
///
/// assert_eq!(filter_actor_id(" http://d-nb.info/gnd/118540238 ", ActorIdScheme::Gnd), "118540238");
/// assert_eq!(filter_actor_id("ULAN:500115493", ActorIdScheme::Gnd), "ULAN:500115493");
/// ```
pub fn filter_actor_id(text: &str, scheme: ActorIdScheme) -> String {
    match scheme {
        ActorIdScheme::Gnd => GND_URI
            .captures(text.trim())
            .and_then(|c| c.get(1))
            .map_or_else(|| text.to_string(), |m| m.as_str().to_string()),
    }
}

/// Replace `info:isil/<code>` URIs by the bare code.
///
/// # Examples
/// ```
/// use lido_indexer::record::strip_isil;
///
/// let ids = vec!["info:isil/DE-Mb112".to_string(), "Museum X".to_string()];
/// assert_eq!(strip_isil(&ids), vec!["DE-Mb112", "Museum X"]);
/// ```
pub fn strip_isil(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            ISIL_URI
                .captures(id)
                .and_then(|c| c.get(1))
                .map_or_else(|| id.clone(), |m| m.as_str().to_string())
        })
        .collect()
}

/// Field getters common to every record variant.
pub trait RecordModel: Send + Sync + std::fmt::Debug {
    /// The shared base record.
    fn base(&self) -> &LidoRecord;

    /// Constant source identifier of the variant.
    fn source_id(&self) -> &str;

    /// Language code used when the record does not state one.
    fn default_language(&self) -> &str;

    fn record_type(&self) -> &str {
        RECORD_TYPE
    }

    /// Native record id.
    fn id(&self) -> &str {
        self.base().rec_id()
    }

    fn linking_id(&self) -> &str {
        self.id()
    }

    /// Actors of matching events with a matching role.
    fn actors(&self, events: Option<&[&str]>, roles: Option<&[&str]>) -> Vec<Actor> {
        self.base().scan_actors(events, roles)
    }

    /// Actor names, deduplicated in first-seen order.
    fn authors(&self) -> Vec<String> {
        unique_preserving_order(self.base().all_actors().iter().map(|a| a.name.as_str()))
    }

    fn author_primary(&self) -> Option<String> {
        self.authors().into_iter().next()
    }

    fn author_secondary(&self) -> Vec<String> {
        self.authors().into_iter().skip(1).collect()
    }

    /// Actor roles, deduplicated and sorted.
    fn author_roles(&self) -> Vec<String> {
        let mut roles = unique_preserving_order(
            self.base()
                .all_actors()
                .iter()
                .map(|a| a.role.as_str())
                .filter(|r| !r.is_empty()),
        );
        roles.sort();
        roles
    }

    /// External actor ids, deduplicated in first-seen order.
    fn author_ids(&self) -> Vec<String> {
        unique_preserving_order(
            self.base()
                .all_actors()
                .iter()
                .map(|a| a.external_id.as_str())
                .filter(|id| !id.is_empty()),
        )
    }

    /// Resolve the date range of matching events.
    ///
    /// # Errors
    /// `InvalidDateRange` when the latest date lies before the earliest.
    fn date_range(&self, events: Option<&[&str]>) -> Result<Option<DateSpan>> {
        let base = self.base();
        base.settings()
            .dates
            .resolve(&base.date_values(events), self.source_id(), self.id())
    }

    /// Institution codes, from the legal body of the record source.
    fn institution(&self) -> Vec<String> {
        strip_isil(self.base().record_source_ids())
    }

    /// Branch libraries or departments; empty unless a source defines them.
    fn branches(&self) -> Vec<String> {
        Vec::new()
    }

    fn record_info_link(&self) -> String {
        self.base().record_info_link().to_string()
    }

    fn related_work_display_object(&self, relation_types: &[&str]) -> String {
        self.base().related_work_display_object(relation_types)
    }

    /// Main title, without trailing punctuation.
    fn title(&self) -> Option<String> {
        let base = self.base();
        let config = &base.settings().normalize;
        base.titles().first().map(|t| {
            normalize_unicode(&strip_trailing_punctuation(t, config), config)
        })
    }

    /// Title up to the first sentence break.
    fn title_short(&self) -> Option<String> {
        let title = self.title()?;
        Some(split_title(&title, &self.base().settings().normalize).unwrap_or(title))
    }

    /// Sort key of the main title.
    fn title_sort(&self) -> Option<String> {
        let title = self.title()?;
        let config = &self.base().settings().normalize;
        let stripped = strip_leading_punctuation(strip_leading_article(&title, config));
        Some(create_sortable_string(stripped))
    }

    /// Titles after the first.
    fn title_alt(&self) -> Vec<String> {
        self.base().titles().iter().skip(1).cloned().collect()
    }

    fn to_xml(&self) -> String {
        self.base().to_xml()
    }
}
