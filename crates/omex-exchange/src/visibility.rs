//! Element visibility rules.
//!
//! Query results pass through one filter that applies the three visibility
//! rules of the exchange service: effective-time windows, Memento
//! placeholders, and duplicate collapsing. The filter is pure over the page
//! it is given; substituting survivors for out-of-page duplicates is the
//! repository's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use omex_core::ElementId;

use crate::options::ExchangeOptions;

/// Validity interval for an element, classification, or relationship.
///
/// Either bound may be open. A query's effective time must fall inside the
/// window for the element to be visible to that query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveWindow {
    /// Start of validity; `None` means "since forever".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<DateTime<Utc>>,

    /// End of validity; `None` means "until further notice".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<DateTime<Utc>>,
}

impl EffectiveWindow {
    /// A window with both bounds open.
    #[must_use]
    pub fn always() -> Self {
        Self::default()
    }

    /// A window bounded on both sides.
    #[must_use]
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            effective_from: Some(from),
            effective_to: Some(to),
        }
    }

    /// Whether the window contains the query's effective time.
    ///
    /// A `None` query time means "any time" and matches every window.
    #[must_use]
    pub fn contains(&self, effective_time: Option<DateTime<Utc>>) -> bool {
        let Some(at) = effective_time else {
            return true;
        };
        if let Some(from) = self.effective_from {
            if at < from {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if at > to {
                return false;
            }
        }
        true
    }
}

/// The filterable view of a repository element.
///
/// Implemented by whatever element type the repository collaborator returns;
/// the visibility filter needs nothing beyond these four facts.
pub trait VisibleElement {
    /// The element's GUID.
    fn element_id(&self) -> ElementId;

    /// The element's validity window.
    fn effective_window(&self) -> EffectiveWindow;

    /// Whether the element is a historical/Memento placeholder.
    fn is_memento(&self) -> bool;

    /// The designated survivor, when this element is flagged as a duplicate
    /// of another.
    fn duplicate_survivor(&self) -> Option<ElementId>;
}

/// A plain element header as returned by the metadata repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementStub {
    /// The element's GUID.
    pub id: ElementId,

    /// Open-metadata type name.
    pub type_name: String,

    /// Element properties.
    pub properties: serde_json::Value,

    /// Validity window.
    #[serde(default)]
    pub effective_window: EffectiveWindow,

    /// Soft-deleted/historical placeholder flag.
    #[serde(default)]
    pub memento: bool,

    /// Set when this element is a known duplicate of another.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_survivor: Option<ElementId>,
}

impl ElementStub {
    /// A live element with open validity and no duplicate flag.
    #[must_use]
    pub fn new(id: ElementId, type_name: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            properties,
            effective_window: EffectiveWindow::always(),
            memento: false,
            duplicate_survivor: None,
        }
    }
}

impl VisibleElement for ElementStub {
    fn element_id(&self) -> ElementId {
        self.id
    }

    fn effective_window(&self) -> EffectiveWindow {
        self.effective_window
    }

    fn is_memento(&self) -> bool {
        self.memento
    }

    fn duplicate_survivor(&self) -> Option<ElementId> {
        self.duplicate_survivor
    }
}

/// Apply the visibility rules to a page of elements.
///
/// - Elements whose effective window excludes `options.effective_time` are
///   dropped (`None` matches everything).
/// - Memento placeholders are dropped unless `for_lineage` is set.
/// - Flagged duplicates are collapsed into their designated survivor unless
///   `for_duplicate_processing` is set; a survivor is emitted at most once
///   no matter how many duplicates point at it.
#[must_use]
pub fn visibility_filter<T: VisibleElement>(elements: Vec<T>, options: &ExchangeOptions) -> Vec<T> {
    let mut seen: HashSet<ElementId> = HashSet::new();
    let mut visible = Vec::with_capacity(elements.len());

    for element in elements {
        if !element.effective_window().contains(options.effective_time) {
            continue;
        }
        if element.is_memento() && !options.for_lineage {
            continue;
        }
        if element.duplicate_survivor().is_some() && !options.for_duplicate_processing {
            // Collapsed into the survivor, which stands for the whole
            // dedup group when the repository returns it.
            continue;
        }
        if seen.insert(element.element_id()) {
            visible.push(element);
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn stub(id: ElementId) -> ElementStub {
        ElementStub::new(id, "Asset", serde_json::json!({}))
    }

    #[test]
    fn test_open_window_contains_everything() {
        let window = EffectiveWindow::always();
        assert!(window.contains(None));
        assert!(window.contains(Some(at(0))));
        assert!(window.contains(Some(at(i32::MAX as i64))));
    }

    #[test]
    fn test_bounded_window() {
        let window = EffectiveWindow::between(at(100), at(200));
        assert!(window.contains(None));
        assert!(!window.contains(Some(at(99))));
        assert!(window.contains(Some(at(100))));
        assert!(window.contains(Some(at(200))));
        assert!(!window.contains(Some(at(201))));
    }

    #[test]
    fn test_half_open_window() {
        let window = EffectiveWindow {
            effective_from: Some(at(100)),
            effective_to: None,
        };
        assert!(!window.contains(Some(at(50))));
        assert!(window.contains(Some(at(5000))));
    }

    #[test]
    fn test_filter_with_no_effective_time_returns_all() {
        let mut a = stub(ElementId::new());
        a.effective_window = EffectiveWindow::between(at(100), at(200));
        let b = stub(ElementId::new());

        let visible = visibility_filter(vec![a, b], &ExchangeOptions::new());
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_filter_drops_elements_outside_window() {
        let id_in = ElementId::new();
        let mut in_window = stub(id_in);
        in_window.effective_window = EffectiveWindow::between(at(100), at(200));
        let mut out_of_window = stub(ElementId::new());
        out_of_window.effective_window = EffectiveWindow::between(at(300), at(400));

        let visible = visibility_filter(
            vec![in_window, out_of_window],
            &ExchangeOptions::at(at(150)),
        );
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, id_in);
    }

    #[test]
    fn test_memento_dropped_unless_for_lineage() {
        let mut placeholder = stub(ElementId::new());
        placeholder.memento = true;

        let hidden = visibility_filter(vec![placeholder.clone()], &ExchangeOptions::new());
        assert!(hidden.is_empty());

        let shown = visibility_filter(vec![placeholder], &ExchangeOptions::new().with_lineage());
        assert_eq!(shown.len(), 1);
    }

    #[test]
    fn test_duplicates_collapse_into_survivor() {
        let survivor_id = ElementId::new();
        let survivor = stub(survivor_id);
        let mut duplicate = stub(ElementId::new());
        duplicate.duplicate_survivor = Some(survivor_id);

        let collapsed = visibility_filter(
            vec![survivor.clone(), duplicate.clone()],
            &ExchangeOptions::new(),
        );
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].id, survivor_id);

        let unmerged = visibility_filter(
            vec![survivor, duplicate],
            &ExchangeOptions::new().with_duplicate_processing(),
        );
        assert_eq!(unmerged.len(), 2);
    }

    #[test]
    fn test_survivor_emitted_once() {
        let survivor_id = ElementId::new();
        let survivor = stub(survivor_id);
        let repeated = stub(survivor_id);

        let visible = visibility_filter(vec![survivor, repeated], &ExchangeOptions::new());
        assert_eq!(visible.len(), 1);
    }
}
