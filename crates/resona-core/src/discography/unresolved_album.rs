use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Raw album metadata as ingested from the primary source, before any
/// cross-catalog resolution. Several barcodes may be attached to one
/// release; the first one is the most trustworthy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), default)]
pub struct UnresolvedAlbum {
    pub title: String,
    pub artists: Vec<String>,
    pub year: Option<i32>,
    pub barcodes: Vec<String>,
    pub catalog_number: Option<String>,
    pub label: Option<String>,
}
