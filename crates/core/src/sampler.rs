use rand::seq::index;
use rand::Rng;

use crate::catalog::AreaGrouping;
use crate::domain::item::{Item, MealTime};
use crate::domain::reply::{Carousel, CarouselCard, DetailAction, DetailKind, ReplyPayload};
use crate::errors::DialogError;

pub const DEFAULT_MAX_ITEMS: usize = 3;
pub const RESTAURANT_THUMBNAIL_URL: &str = "https://i.imgur.com/97LucO0.jpg";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sampler {
    max_items: usize,
    thumbnail_url: Option<String>,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl Sampler {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items: max_items.max(1),
            thumbnail_url: Some(RESTAURANT_THUMBNAIL_URL.to_owned()),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Draws `min(max_items, |area|)` distinct restaurants uniformly at random.
    pub fn sample<'a, R>(
        &self,
        grouping: &'a AreaGrouping,
        category: MealTime,
        area: &str,
        rng: &mut R,
    ) -> Result<Vec<&'a Item>, DialogError>
    where
        R: Rng + ?Sized,
    {
        let items = grouping.get(area).ok_or_else(|| DialogError::UnknownSubcategory {
            category,
            subcategory: area.to_owned(),
        })?;

        let amount = self.max_items.min(items.len());
        Ok(index::sample(rng, items.len(), amount)
            .into_iter()
            .map(|position| &items[position])
            .collect())
    }

    pub fn carousel(&self, items: &[&Item]) -> ReplyPayload {
        let cards = items.iter().map(|item| self.card(item)).collect();
        ReplyPayload::Carousel(Carousel { cards })
    }

    pub fn card(&self, item: &Item) -> CarouselCard {
        CarouselCard {
            title: item.name.clone(),
            body: item.description.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            actions: vec![
                DetailAction::new(DetailKind::Address, item.address()),
                DetailAction::new(DetailKind::Phone, item.phone()),
                DetailAction::new(DetailKind::Comment, item.comment()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::Sampler;
    use crate::catalog::Catalog;
    use crate::domain::item::MealTime;
    use crate::domain::reply::{DetailKind, ReplyPayload};
    use crate::errors::DialogError;
    use crate::fixtures;

    fn catalog() -> Catalog {
        Catalog::load(&fixtures::demo_source()).expect("fixture catalog loads")
    }

    #[test]
    fn sample_size_is_bounded_by_group_size() {
        let catalog = catalog();
        let breakfast = catalog.groups_of(MealTime::Breakfast).expect("breakfast");
        let sampler = Sampler::default();
        let mut rng = StdRng::seed_from_u64(7);

        for group in breakfast.groups() {
            for _ in 0..50 {
                let picks = sampler
                    .sample(breakfast, MealTime::Breakfast, &group.name, &mut rng)
                    .expect("area exists");
                assert_eq!(picks.len(), group.items.len().min(3));

                let names: HashSet<_> = picks.iter().map(|item| item.name.as_str()).collect();
                assert_eq!(names.len(), picks.len(), "no duplicates within one draw");
                assert!(picks.iter().all(|item| group.items.contains(item)));
            }
        }
    }

    #[test]
    fn every_item_in_a_large_group_is_eventually_drawn() {
        let catalog = catalog();
        let breakfast = catalog.groups_of(MealTime::Breakfast).expect("breakfast");
        let sampler = Sampler::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let picks =
                sampler.sample(breakfast, MealTime::Breakfast, "中區", &mut rng).expect("area");
            seen.extend(picks.into_iter().map(|item| item.name.clone()));
        }

        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn same_seed_gives_same_draw() {
        let catalog = catalog();
        let breakfast = catalog.groups_of(MealTime::Breakfast).expect("breakfast");
        let sampler = Sampler::default();

        let first = sampler
            .sample(breakfast, MealTime::Breakfast, "中區", &mut StdRng::seed_from_u64(42))
            .expect("area");
        let second = sampler
            .sample(breakfast, MealTime::Breakfast, "中區", &mut StdRng::seed_from_u64(42))
            .expect("area");

        assert_eq!(first, second);
    }

    #[test]
    fn unknown_area_is_reported() {
        let catalog = catalog();
        let lunch = catalog.groups_of(MealTime::Lunch).expect("lunch");

        let error = Sampler::default()
            .sample(lunch, MealTime::Lunch, "大雅區", &mut StdRng::seed_from_u64(1))
            .expect_err("area is not listed for lunch");

        assert_eq!(
            error,
            DialogError::UnknownSubcategory {
                category: MealTime::Lunch,
                subcategory: "大雅區".to_owned()
            }
        );
    }

    #[test]
    fn carousel_cards_carry_resolved_details() {
        let catalog = catalog();
        let breakfast = catalog.groups_of(MealTime::Breakfast).expect("breakfast");
        let items = breakfast.get("西區").expect("area");
        let picks: Vec<_> = items.iter().collect();

        let ReplyPayload::Carousel(carousel) = Sampler::default().carousel(&picks) else {
            panic!("expected a carousel");
        };

        assert_eq!(carousel.cards.len(), 2);
        let first = &carousel.cards[0];
        assert_eq!(first.title, "審計新村咖啡");
        assert_eq!(first.body, "09:00-17:00");
        let kinds: Vec<_> = first.actions.iter().map(|action| action.kind).collect();
        assert_eq!(kinds, vec![DetailKind::Address, DetailKind::Phone, DetailKind::Comment]);
        assert_eq!(first.actions[0].value, "台中市西區民生路368巷");
        assert_eq!(first.actions[1].value, "這是電話");

        let second = &carousel.cards[1];
        assert_eq!(second.actions[2].value, "這是評論");
    }

    #[test]
    fn max_items_is_configurable() {
        let catalog = catalog();
        let breakfast = catalog.groups_of(MealTime::Breakfast).expect("breakfast");

        let picks = Sampler::new(1)
            .sample(breakfast, MealTime::Breakfast, "中區", &mut StdRng::seed_from_u64(3))
            .expect("area");
        assert_eq!(picks.len(), 1);
        assert_eq!(Sampler::new(0).max_items(), 1);
    }
}
