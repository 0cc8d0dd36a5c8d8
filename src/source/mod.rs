//! Capabilities the view borrows from its host.
//!
//! [`FamilyTreeSource`] is the data fetch, [`LoadingIndicator`] the spinner.
//! Native hosts and tests implement both directly; the wasm facade maps them
//! onto JS callbacks instead.

mod local;

pub use local::LocalSource;

use crate::error::FetchError;
use crate::model::{FamilyTreeGraph, PersonId};

/// Fetches the family tree around a root person.
pub trait FamilyTreeSource {
    /// Everyone within `distance` relations of `root` (`None` = unbounded).
    fn fetch_family_tree(
        &mut self,
        root: &PersonId,
        distance: Option<u32>,
    ) -> Result<FamilyTreeGraph, FetchError>;
}

/// Loading feedback around a fetch.
pub trait LoadingIndicator {
    fn show_loading(&mut self);

    fn hide_loading(&mut self);

    /// Called when a fetch fails. The spinner is left as it is.
    fn show_error(&mut self, _error: &FetchError) {}
}

/// Indicator that shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoadingIndicator;

impl LoadingIndicator for NoLoadingIndicator {
    fn show_loading(&mut self) {}

    fn hide_loading(&mut self) {}
}
