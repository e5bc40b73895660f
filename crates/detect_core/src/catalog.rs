//! Category catalog and the per-category visual dispatch table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One supported classification target with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identifier, used verbatim as the endpoint path segment.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Color tag such as `"pink"`; resolved through [`tag_color`].
    pub visual_tag: String,
}

impl Category {
    pub fn new(id: &str, name: &str, description: &str, visual_tag: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            visual_tag: visual_tag.to_string(),
        }
    }
}

/// Icon shown on a category tile and banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryIcon {
    Clinic,
    Brain,
    Ribbon,
    Female,
    Kidneys,
    Lungs,
    Virus,
    Smile,
    /// Used for categories that have no dedicated icon.
    Generic,
}

impl CategoryIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            CategoryIcon::Clinic => "⚕",
            CategoryIcon::Brain => "🧠",
            CategoryIcon::Ribbon => "🎗",
            CategoryIcon::Female => "♀",
            CategoryIcon::Kidneys => "🫘",
            CategoryIcon::Lungs => "🫁",
            CategoryIcon::Virus => "🦠",
            CategoryIcon::Smile => "☺",
            CategoryIcon::Generic => "🖼",
        }
    }
}

/// Rendering capabilities resolved once per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    pub icon: CategoryIcon,
    /// Tile color as RGB.
    pub color: [u8; 3],
}

impl CategoryStyle {
    pub const FALLBACK: CategoryStyle = CategoryStyle {
        icon: CategoryIcon::Generic,
        color: [107, 114, 128],
    };
}

/// Maps a visual tag to its RGB tile color.
pub fn tag_color(tag: &str) -> Option<[u8; 3]> {
    let rgb = match tag.trim().to_ascii_lowercase().as_str() {
        "red" => [239, 68, 68],
        "purple" => [168, 85, 247],
        "pink" => [236, 72, 153],
        "teal" => [20, 184, 166],
        "orange" => [249, 115, 22],
        "blue" => [59, 130, 246],
        "green" => [34, 197, 94],
        "yellow" => [234, 179, 8],
        "gray" | "grey" => [107, 114, 128],
        _ => return None,
    };
    Some(rgb)
}

fn builtin_icon(id: &str) -> Option<CategoryIcon> {
    let icon = match id {
        "all" => CategoryIcon::Clinic,
        "brain" => CategoryIcon::Brain,
        "breast" => CategoryIcon::Ribbon,
        "cervical" => CategoryIcon::Female,
        "kidney" => CategoryIcon::Kidneys,
        "lung-colon" => CategoryIcon::Lungs,
        "lymphoma" => CategoryIcon::Virus,
        "oral" => CategoryIcon::Smile,
        _ => return None,
    };
    Some(icon)
}

/// Immutable, ordered list of categories plus their style table.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
    styles: HashMap<String, CategoryStyle>,
}

impl CategoryCatalog {
    /// Builds a catalog with styles derived from the built-in icon table and each
    /// category's visual tag. Duplicate ids keep their first occurrence.
    pub fn new(categories: Vec<Category>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let categories: Vec<Category> = categories
            .into_iter()
            .filter(|c| {
                let fresh = seen.insert(c.id.clone());
                if !fresh {
                    tracing::warn!("duplicate category id ignored: {}", c.id);
                }
                fresh
            })
            .collect();
        let styles = categories
            .iter()
            .map(|c| {
                let style = CategoryStyle {
                    icon: builtin_icon(&c.id).unwrap_or(CategoryStyle::FALLBACK.icon),
                    color: tag_color(&c.visual_tag).unwrap_or(CategoryStyle::FALLBACK.color),
                };
                (c.id.clone(), style)
            })
            .collect();
        Self { categories, styles }
    }

    /// Builds a catalog with an explicit style table. Ids missing from `styles`
    /// render with [`CategoryStyle::FALLBACK`].
    pub fn with_styles(categories: Vec<Category>, styles: HashMap<String, CategoryStyle>) -> Self {
        let mut catalog = Self::new(categories);
        catalog.styles = styles;
        catalog
    }

    /// The eight categories served by the reference classification backend.
    pub fn builtin() -> Self {
        Self::new(vec![
            Category::new(
                "all",
                "Acute Lymphoblastic Leukemia (ALL)",
                "Blood cancer affecting white blood cells",
                "red",
            ),
            Category::new(
                "brain",
                "Brain Cancer",
                "Tumors in brain tissue and nervous system",
                "purple",
            ),
            Category::new("breast", "Breast Cancer", "Cancer in breast tissue cells", "pink"),
            Category::new(
                "cervical",
                "Cervical Cancer",
                "Cancer of the cervix in women",
                "teal",
            ),
            Category::new(
                "kidney",
                "Kidney Cancer",
                "Cancer in kidney cells and tissues",
                "orange",
            ),
            Category::new(
                "lung-colon",
                "Lung and Colon Cancer",
                "Respiratory and digestive system cancers",
                "blue",
            ),
            Category::new("lymphoma", "Lymphoma", "Cancer of the lymphatic system", "green"),
            Category::new(
                "oral",
                "Oral Cancer",
                "Cancer in mouth, tongue, and throat",
                "yellow",
            ),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Style for `id`, falling back to [`CategoryStyle::FALLBACK`].
    pub fn style_for(&self, id: &str) -> CategoryStyle {
        self.styles
            .get(id)
            .copied()
            .unwrap_or(CategoryStyle::FALLBACK)
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builtin_catalog_keeps_declared_order() {
        let catalog = CategoryCatalog::builtin();
        let ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "all",
                "brain",
                "breast",
                "cervical",
                "kidney",
                "lung-colon",
                "lymphoma",
                "oral"
            ]
        );
    }

    #[rstest]
    #[case("breast", CategoryIcon::Ribbon, [236, 72, 153])]
    #[case("lung-colon", CategoryIcon::Lungs, [59, 130, 246])]
    #[case("all", CategoryIcon::Clinic, [239, 68, 68])]
    fn builtin_styles_resolve(
        #[case] id: &str,
        #[case] icon: CategoryIcon,
        #[case] color: [u8; 3],
    ) {
        let style = CategoryCatalog::builtin().style_for(id);
        assert_eq!(style.icon, icon);
        assert_eq!(style.color, color);
    }

    #[test]
    fn unknown_id_gets_fallback_style() {
        let catalog = CategoryCatalog::builtin();
        assert!(catalog.find("skin").is_none());
        assert_eq!(catalog.style_for("skin"), CategoryStyle::FALLBACK);
    }

    #[test]
    fn custom_category_without_icon_uses_generic_icon_and_tag_color() {
        let catalog =
            CategoryCatalog::new(vec![Category::new("skin", "Skin Cancer", "Melanoma", "teal")]);
        let style = catalog.style_for("skin");
        assert_eq!(style.icon, CategoryIcon::Generic);
        assert_eq!(style.color, [20, 184, 166]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let catalog = CategoryCatalog::new(vec![
            Category::new("oral", "Oral Cancer", "first", "yellow"),
            Category::new("oral", "Other", "second", "red"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("oral").map(|c| c.description.as_str()), Some("first"));
    }

    #[test]
    fn explicit_style_table_overrides_builtin_and_falls_back() {
        let mut styles = HashMap::new();
        styles.insert(
            "brain".to_string(),
            CategoryStyle {
                icon: CategoryIcon::Generic,
                color: [0, 0, 0],
            },
        );
        let catalog = CategoryCatalog::with_styles(
            CategoryCatalog::builtin().iter().cloned().collect(),
            styles,
        );
        assert_eq!(catalog.style_for("brain").color, [0, 0, 0]);
        assert_eq!(catalog.style_for("breast"), CategoryStyle::FALLBACK);
    }
}
