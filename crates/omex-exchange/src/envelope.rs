//! Request envelopes and paging.
//!
//! One generic envelope parameterized by payload type replaces the
//! one-class-per-endpoint request-body hierarchy of the transport layer.
//! Paged results carry enough state for the caller to ask for the next
//! slice.

use serde::{Deserialize, Serialize};

use omex_core::{OmexError, OmexResult};

use crate::options::{AssetManagerIdentity, ExchangeOptions};

/// A slice request over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of results to skip.
    #[serde(default)]
    pub start_from: u32,

    /// Maximum number of results to return.
    pub page_size: u32,
}

impl PageRequest {
    /// Create a page request starting at the first result.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            start_from: 0,
            page_size,
        }
    }

    /// The request for the slice following this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            start_from: self.start_from + self.page_size,
            page_size: self.page_size,
        }
    }

    /// Reject degenerate page sizes before they reach the store.
    pub fn validate(&self) -> OmexResult<()> {
        if self.page_size == 0 {
            return Err(OmexError::invalid_parameter(
                "pageSize",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// One slice of a larger result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The elements in this slice.
    pub elements: Vec<T>,

    /// Offset this slice started at.
    pub start_from: u32,

    /// Whether more results exist past this slice.
    pub more: bool,
}

impl<T> Page<T> {
    /// An empty page at the given offset.
    #[must_use]
    pub fn empty(start_from: u32) -> Self {
        Self {
            elements: Vec::new(),
            start_from,
            more: false,
        }
    }

    /// Build a page from a fetch that read one element past the page size.
    ///
    /// The store reads `page_size + 1` rows; the extra row, if present, only
    /// signals that another slice exists and is not returned.
    #[must_use]
    pub fn from_overfetch(mut elements: Vec<T>, request: &PageRequest) -> Self {
        let more = elements.len() > request.page_size as usize;
        if more {
            elements.truncate(request.page_size as usize);
        }
        Self {
            elements,
            start_from: request.start_from,
            more,
        }
    }

    /// Map the element type, keeping the paging state.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            elements: self.elements.into_iter().map(f).collect(),
            start_from: self.start_from,
            more: self.more,
        }
    }
}

/// A complete exchange call: who is calling, under which options, with what
/// payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest<T> {
    /// The calling asset manager.
    pub identity: AssetManagerIdentity,

    /// Recognized option flags for this call.
    #[serde(default)]
    pub options: ExchangeOptions,

    /// Operation-specific payload.
    pub payload: T,
}

impl<T> ExchangeRequest<T> {
    /// Wrap a payload with the caller's identity and default options.
    #[must_use]
    pub fn new(identity: AssetManagerIdentity, payload: T) -> Self {
        Self {
            identity,
            options: ExchangeOptions::default(),
            payload,
        }
    }

    /// Replace the options on this request.
    #[must_use]
    pub fn with_options(mut self, options: ExchangeOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_page_size_is_invalid() {
        let request = PageRequest {
            start_from: 0,
            page_size: 0,
        };
        assert!(request.validate().is_err());
        assert!(PageRequest::new(10).validate().is_ok());
    }

    #[test]
    fn test_next_advances_offset() {
        let request = PageRequest::new(25);
        let next = request.next();
        assert_eq!(next.start_from, 25);
        assert_eq!(next.page_size, 25);
    }

    #[test]
    fn test_from_overfetch_truncates_and_flags_more() {
        let request = PageRequest::new(2);
        let page = Page::from_overfetch(vec![1, 2, 3], &request);
        assert_eq!(page.elements, vec![1, 2]);
        assert!(page.more);

        let last = Page::from_overfetch(vec![1, 2], &request);
        assert_eq!(last.elements, vec![1, 2]);
        assert!(!last.more);
    }

    #[test]
    fn test_map_keeps_paging_state() {
        let page = Page {
            elements: vec![1, 2],
            start_from: 4,
            more: true,
        };
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.elements, vec!["1", "2"]);
        assert_eq!(mapped.start_from, 4);
        assert!(mapped.more);
    }
}
