use url::Url;

//
// ─── TEXT ENCODING ─────────────────────────────────────────────────────────────
//

/// The bank stores commas as `_` so records survive a CSV export.
#[must_use]
pub fn decode_commas(raw: &str) -> String {
    raw.replace('_', ",")
}

/// Inverse of [`decode_commas`], applied to user-written notes before storage.
#[must_use]
pub fn encode_commas(raw: &str) -> String {
    raw.replace(',', "_")
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

const IMAGE_DIR: &str = "images/";
const IMAGE_EXTENSIONS: [&str; 6] = ["jpeg", "jpg", "gif", "png", "webp", "svg"];

/// Relative path of an image shipped next to the question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath(String);

impl ImagePath {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against the asset base, falling back to the relative path when
    /// there is no base or the join fails.
    #[must_use]
    pub fn resolve(&self, base: Option<&Url>) -> String {
        base.and_then(|base| base.join(&self.0).ok())
            .map_or_else(|| self.0.clone(), |url| url.to_string())
    }
}

/// A question body part that is either inline text or an image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Image(ImagePath),
}

impl Content {
    /// Classify a raw bank field. Blank fields carry no content.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if is_image_reference(trimmed) {
            return Some(Self::Image(ImagePath(trimmed.to_owned())));
        }
        Some(Self::Text(trimmed.to_owned()))
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// Text with commas restored, or the image path as-is.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => decode_commas(text),
            Self::Image(path) => path.as_str().to_owned(),
        }
    }
}

fn is_image_reference(raw: &str) -> bool {
    if !raw.starts_with(IMAGE_DIR) {
        return false;
    }
    raw.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}
