use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::item::{Item, MealTime};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog source `{path}`: {source}")]
    ReadSource { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog source `{path}`: {source}")]
    ParseSource { path: PathBuf, source: toml::de::Error },
    #[error("{category} row {row} is missing required field `{field}`")]
    MissingField { category: MealTime, row: usize, field: &'static str },
    #[error("{category} catalog has no restaurants")]
    EmptyCategory { category: MealTime },
    #[error("{category} is not loaded in the catalog")]
    UnknownCategory { category: MealTime },
}

impl CatalogError {
    /// True for failures raised while loading, which must stop startup.
    pub fn is_data_load_error(&self) -> bool {
        !matches!(self, Self::UnknownCategory { .. })
    }
}

pub trait CatalogSource {
    fn load_category(&self, category: MealTime) -> Result<Vec<Item>, CatalogError>;
}

/// Reads `<data_dir>/<stem>.toml` files holding a `[[restaurants]]` array.
#[derive(Clone, Debug)]
pub struct TomlDirectorySource {
    data_dir: PathBuf,
}

impl TomlDirectorySource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn path_for(&self, category: MealTime) -> PathBuf {
        self.data_dir.join(format!("{}.toml", category.dataset_stem()))
    }
}

impl CatalogSource for TomlDirectorySource {
    fn load_category(&self, category: MealTime) -> Result<Vec<Item>, CatalogError> {
        let path = self.path_for(category);
        let raw = fs::read_to_string(&path)
            .map_err(|source| CatalogError::ReadSource { path: path.clone(), source })?;
        parse_dataset(&raw, category, &path)
    }
}

pub fn parse_dataset(
    raw: &str,
    category: MealTime,
    path: &Path,
) -> Result<Vec<Item>, CatalogError> {
    let dataset = toml::from_str::<DatasetFile>(raw)
        .map_err(|source| CatalogError::ParseSource { path: path.to_path_buf(), source })?;

    dataset
        .restaurants
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_item(category, index + 1))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    restaurants: Vec<RestaurantRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct RestaurantRecord {
    name: Option<String>,
    opentime: Option<String>,
    phone: Option<String>,
    area: Option<String>,
    address: Option<String>,
    comment: Option<String>,
}

impl RestaurantRecord {
    fn into_item(self, category: MealTime, row: usize) -> Result<Item, CatalogError> {
        let required = |value: Option<String>, field: &'static str| {
            value
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .ok_or(CatalogError::MissingField { category, row, field })
        };

        Ok(Item {
            name: required(self.name, "name")?,
            description: required(self.opentime, "opentime")?,
            category,
            subcategory: required(self.area, "area")?,
            address: self.address,
            phone: self.phone,
            comment: self.comment,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticCatalogSource {
    items: HashMap<MealTime, Vec<Item>>,
}

impl StaticCatalogSource {
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut grouped: HashMap<MealTime, Vec<Item>> = HashMap::new();
        for item in items {
            grouped.entry(item.category).or_default().push(item);
        }
        Self { items: grouped }
    }
}

impl CatalogSource for StaticCatalogSource {
    fn load_category(&self, category: MealTime) -> Result<Vec<Item>, CatalogError> {
        Ok(self.items.get(&category).cloned().unwrap_or_default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaGroup {
    pub name: String,
    pub items: Vec<Item>,
}

/// Restaurants of one meal time grouped by area. Areas are sorted by name;
/// restaurants keep their source order within an area.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AreaGrouping {
    groups: Vec<AreaGroup>,
}

impl AreaGrouping {
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut by_area: BTreeMap<String, Vec<Item>> = BTreeMap::new();
        for item in items {
            by_area.entry(item.subcategory.clone()).or_default().push(item);
        }

        let groups =
            by_area.into_iter().map(|(name, items)| AreaGroup { name, items }).collect();
        Self { groups }
    }

    pub fn get(&self, area: &str) -> Option<&[Item]> {
        self.groups.iter().find(|group| group.name == area).map(|group| group.items.as_slice())
    }

    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.name.as_str())
    }

    pub fn groups(&self) -> &[AreaGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    groupings: BTreeMap<MealTime, AreaGrouping>,
}

impl Catalog {
    /// Loads every meal time from `source`. Any failure aborts the whole load.
    pub fn load<S>(source: &S) -> Result<Self, CatalogError>
    where
        S: CatalogSource + ?Sized,
    {
        let mut groupings = BTreeMap::new();

        for category in MealTime::ALL {
            let items = source.load_category(category)?;
            if items.is_empty() {
                return Err(CatalogError::EmptyCategory { category });
            }

            let grouping = AreaGrouping::from_items(items);
            info!(
                event_name = "catalog.category_loaded",
                category = %category,
                areas = grouping.len(),
                restaurants = grouping.item_count(),
                "catalog category loaded"
            );
            groupings.insert(category, grouping);
        }

        Ok(Self { groupings })
    }

    /// Builds a catalog holding only the meal times present in `items`.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut by_category: BTreeMap<MealTime, Vec<Item>> = BTreeMap::new();
        for item in items {
            by_category.entry(item.category).or_default().push(item);
        }
        let groupings = by_category
            .into_iter()
            .map(|(category, items)| (category, AreaGrouping::from_items(items)))
            .collect();
        Self { groupings }
    }

    pub fn groups_of(&self, category: MealTime) -> Result<&AreaGrouping, CatalogError> {
        self.groupings.get(&category).ok_or(CatalogError::UnknownCategory { category })
    }

    pub fn subcategories_of(&self, category: MealTime) -> Result<Vec<&str>, CatalogError> {
        Ok(self.groups_of(category)?.areas().collect())
    }

    pub fn categories(&self) -> impl Iterator<Item = MealTime> + '_ {
        self.groupings.keys().copied()
    }

    pub fn item_count(&self) -> usize {
        self.groupings.values().map(AreaGrouping::item_count).sum()
    }
}
