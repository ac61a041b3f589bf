//! Tag handling shared by the feature and POI readers.
//!
//! Provides helpers to:
//! - turn loosely typed JSON tag values into plain strings; and
//! - classify a feature into the family its join passes expect.

use std::collections::BTreeMap;

use serde_json::Value;
use waymesh_core::{Feature, FeatureGeometry, FeatureKind, Tags};

/// Render a scalar JSON value as a tag string.
///
/// Strings are kept as they are; numbers and booleans are stringified.
/// `null`, arrays and objects are not tag values.
pub(crate) fn tag_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Collect the scalar entries of a JSON object into [`Tags`], skipping keys in
/// `reserved`.
pub(crate) fn collect_tags<'a, I>(entries: I, reserved: &[&str]) -> Tags
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    entries
        .into_iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .filter_map(|(key, value)| Some((key.clone(), tag_value(value)?)))
        .collect()
}

/// Family a feature belongs to, or `None` for a line that is neither a
/// footway, a cycleway nor a crossing.
///
/// # Examples
/// ```
/// use waymesh_core::{Feature, FeatureKind};
/// use waymesh_data::classify;
///
/// let mut kerb = Feature::point(1_u64, 9.19, 45.46);
/// kerb.tags.insert("highway".into(), "crossing".into());
/// assert_eq!(classify(&kerb), Some(FeatureKind::CrossingNode));
/// ```
#[must_use]
pub fn classify(feature: &Feature) -> Option<FeatureKind> {
    match feature.geometry {
        FeatureGeometry::Point(_) => Some(
            if feature.has_tag("highway", "crossing") || feature.tag("crossing").is_some() {
                FeatureKind::CrossingNode
            } else {
                FeatureKind::StreetNode
            },
        ),
        FeatureGeometry::Line(_) => classify_line(feature),
    }
}

fn classify_line(feature: &Feature) -> Option<FeatureKind> {
    let crossing = feature.has_tag("footway", "crossing")
        || feature.has_tag("cycleway", "crossing")
        || feature.has_tag("highway", "crossing")
        || feature.tag("crossing").is_some();
    if crossing {
        return Some(FeatureKind::CrossingWay);
    }
    let highway = feature.tag("highway");
    if highway == Some("cycleway") || feature.tags.keys().any(|key| key.starts_with("cycleway")) {
        return Some(FeatureKind::Cycleway);
    }
    matches!(highway, Some("footway" | "pedestrian" | "path" | "steps"))
        .then_some(FeatureKind::Footway)
}

/// Features grouped by family. Unclassified features are counted, not kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFamilies {
    families: BTreeMap<FeatureKind, Vec<Feature>>,
    /// Lines that matched no family.
    pub unclassified: usize,
}

impl FeatureFamilies {
    /// Classify every feature with [`classify`].
    #[must_use]
    pub fn classify(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut grouped = Self::default();
        grouped.classify_into(features);
        grouped
    }

    /// Classify every feature into the existing families.
    ///
    /// Returns how many of `features` matched no family; the running total
    /// is kept in [`FeatureFamilies::unclassified`].
    pub fn classify_into(&mut self, features: impl IntoIterator<Item = Feature>) -> usize {
        let mut unmatched = 0;
        for feature in features {
            match classify(&feature) {
                Some(kind) => self.insert(kind, feature),
                None => unmatched += 1,
            }
        }
        self.unclassified += unmatched;
        unmatched
    }

    /// Add `feature` to `kind` regardless of its tags.
    pub fn insert(&mut self, kind: FeatureKind, feature: Feature) {
        self.families.entry(kind).or_default().push(feature);
    }

    /// Add every feature to `kind` regardless of its tags.
    pub fn extend(&mut self, kind: FeatureKind, features: impl IntoIterator<Item = Feature>) {
        self.families.entry(kind).or_default().extend(features);
    }

    /// Features of one family, in input order.
    #[must_use]
    pub fn get(&self, kind: FeatureKind) -> &[Feature] {
        self.families.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Families that hold at least one feature.
    pub fn kinds(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.families
            .iter()
            .filter(|(_, features)| !features.is_empty())
            .map(|(kind, _)| *kind)
    }
}
