use eatba_core::catalog::{Catalog, TomlDirectorySource};
use eatba_core::config::{AppConfig, LoadOptions};
use eatba_core::domain::item::MealTime;
use serde::Serialize;

use super::{CommandResult, EXIT_CATALOG, EXIT_CONFIG, EXIT_USAGE};

#[derive(Debug, Serialize)]
struct CategorySummary {
    category: MealTime,
    selection_token: &'static str,
    restaurants: usize,
    areas: Vec<AreaSummary>,
}

#[derive(Debug, Serialize)]
struct AreaSummary {
    name: String,
    restaurants: Vec<String>,
}

pub fn run(category: Option<&str>) -> CommandResult {
    let filter = match category.map(str::parse::<MealTime>).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            let message = error.to_string();
            return CommandResult::failure("catalog", "invalid_argument", message, EXIT_USAGE);
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "catalog",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let catalog = match Catalog::load(&TomlDirectorySource::new(&config.catalog.data_dir)) {
        Ok(catalog) => catalog,
        Err(error) => {
            let message = error.to_string();
            return CommandResult::failure("catalog", "catalog_load", message, EXIT_CATALOG);
        }
    };

    let summaries: Vec<CategorySummary> = catalog
        .categories()
        .filter(|category| filter.map_or(true, |wanted| wanted == *category))
        .filter_map(|category| summarize(&catalog, category))
        .collect();

    let message = format!(
        "{} restaurants across {} meal time(s) from `{}`",
        summaries.iter().map(|summary| summary.restaurants).sum::<usize>(),
        summaries.len(),
        config.catalog.data_dir.display()
    );
    CommandResult::success_with_data("catalog", message, serde_json::to_value(&summaries).ok())
}

fn summarize(catalog: &Catalog, category: MealTime) -> Option<CategorySummary> {
    let grouping = catalog.groups_of(category).ok()?;
    Some(CategorySummary {
        category,
        selection_token: category.selection_token(),
        restaurants: grouping.item_count(),
        areas: grouping
            .groups()
            .iter()
            .map(|group| AreaSummary {
                name: group.name.clone(),
                restaurants: group.items.iter().map(|item| item.name.clone()).collect(),
            })
            .collect(),
    })
}
