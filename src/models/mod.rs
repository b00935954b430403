use serde::{Deserialize, Serialize};

fn default_level() -> u32 {
    1
}

/// One entry of the document outline.
///
/// Wire shape is shared with the document service: `contentHtml` is camel-case,
/// everything else is a plain key. Missing `level`/`children` are tolerated so a
/// sparse server tree still loads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Section {
    pub id: String,
    pub title: String,

    #[serde(default = "default_level")]
    pub level: u32,

    #[serde(rename = "contentHtml", default)]
    pub content_html: String,

    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    pub fn new(id: String, title: &str, level: u32) -> Self {
        Self {
            id,
            title: title.to_string(),
            level,
            content_html: "<p></p>".to_string(),
            children: vec![],
        }
    }
}

/// Payload returned by upload and report fetch.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<Section>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub(crate) enum ClipboardMode {
    Cut,
    Copy,
}

/// Pending cut/copy. Resolved against the live tree at paste time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Clipboard {
    pub mode: ClipboardMode,
    pub id: String,
}

/// Where a dragged section lands relative to the row it was dropped on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DropPosition {
    Before,
    Inside,
    After,
}

impl DropPosition {
    /// Top quarter of the row inserts before, bottom quarter after, the rest nests.
    pub fn from_offset(offset_y: f64, row_height: f64) -> Self {
        if row_height <= 0.0 {
            return DropPosition::Inside;
        }
        let ratio = offset_y / row_height;
        if ratio < 0.25 {
            DropPosition::Before
        } else if ratio > 0.75 {
            DropPosition::After
        } else {
            DropPosition::Inside
        }
    }
}
