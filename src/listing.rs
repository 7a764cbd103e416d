use std::sync::Arc;

use tracing::warn;

use crate::recipes::dto::{Pagination, Recipe, RecipeFilters};
use crate::recipes::service::RecipeSearch;

/// Filter-form plus pagination state for the browse view. Field edits
/// only mutate local state; a request goes out on `load`, `apply` or
/// `set_page`, one per call.
pub struct ListingController {
    service: Arc<dyn RecipeSearch>,
    filters: RecipeFilters,
    pagination: Pagination,
    recipes: Vec<Recipe>,
}

impl ListingController {
    pub fn new(service: Arc<dyn RecipeSearch>, page_size: usize) -> Self {
        Self {
            service,
            filters: RecipeFilters::default(),
            pagination: Pagination::first(page_size),
            recipes: Vec::new(),
        }
    }

    pub fn filters_mut(&mut self) -> &mut RecipeFilters {
        &mut self.filters
    }

    pub fn filters(&self) -> &RecipeFilters {
        &self.filters
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Initial load of the first page with whatever the filters hold.
    pub async fn load(&mut self) -> &[Recipe] {
        self.refresh().await
    }

    /// Explicit "find recipes" action after editing the filter form.
    pub async fn apply(&mut self) -> &[Recipe] {
        self.refresh().await
    }

    /// Paginator navigation: adopt the control's page index and size,
    /// then refetch exactly once.
    pub async fn set_page(&mut self, page: usize, page_size: usize) -> &[Recipe] {
        self.pagination.page = page;
        self.pagination.page_size = page_size;
        self.refresh().await
    }

    async fn refresh(&mut self) -> &[Recipe] {
        match self
            .service
            .find_by_filter(&self.filters, &self.pagination)
            .await
        {
            Ok(envelope) => {
                self.recipes = envelope.data;
                // server-reported paging metadata replaces ours wholesale
                self.pagination = envelope.pagination;
            }
            Err(e) => {
                warn!(error = %e, "filtered listing request failed");
                self.recipes.clear();
            }
        }
        &self.recipes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::recipes::dto::{DietaryPreference, Difficulty, Envelope};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeListing {
        requests: Mutex<Vec<(RecipeFilters, Pagination)>>,
        fail: bool,
    }

    impl FakeListing {
        fn requests(&self) -> Vec<(RecipeFilters, Pagination)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecipeSearch for FakeListing {
        async fn search_by_name(
            &self,
            _name: &str,
            _page: usize,
            _size: usize,
        ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
            unreachable!("listing controller never hits the name path")
        }

        async fn find_by_filter(
            &self,
            filters: &RecipeFilters,
            pagination: &Pagination,
        ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
            self.requests
                .lock()
                .unwrap()
                .push((filters.clone(), *pagination));
            if self.fail {
                return Err(ApiError::Decode("boom".into()));
            }
            let recipe = Recipe {
                id: Uuid::new_v4(),
                name: "Lentil salad".into(),
                user: None,
                instructions: "Boil lentils, toss with dressing.".into(),
                image_url: None,
                prep_time_minutes: 10,
                cook_time_minutes: 25,
                difficulty: Difficulty::Easy,
                estimated_calories: 400,
                average_rating: None,
                created_at: None,
                updated_at: None,
                tags: vec![],
                ingredients: vec![],
                ratings: vec![],
                allergies: vec![],
            };
            Ok(Envelope {
                data: vec![recipe],
                pagination: Pagination {
                    page: pagination.page,
                    last_page: 3,
                    page_size: pagination.page_size,
                },
            })
        }
    }

    #[tokio::test]
    async fn field_edits_do_not_fetch_but_apply_does() {
        let fake = Arc::new(FakeListing::default());
        let mut listing = ListingController::new(fake.clone(), 10);

        listing.filters_mut().cook_time_minutes = 30;
        listing.filters_mut().difficulty = Difficulty::Easy;
        listing.filters_mut().dietary_preference = DietaryPreference::Vegetarian;
        assert!(fake.requests().is_empty());

        listing.apply().await;
        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.cook_time_minutes, 30);
        assert_eq!(requests[0].0.difficulty, Difficulty::Easy);
    }

    #[tokio::test]
    async fn page_change_fetches_once_with_new_page_values() {
        let fake = Arc::new(FakeListing::default());
        let mut listing = ListingController::new(fake.clone(), 10);

        listing.load().await;
        listing.set_page(1, 25).await;

        let requests = fake.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].1.page, 1);
        assert_eq!(requests[1].1.page_size, 25);
    }

    #[tokio::test]
    async fn envelope_pagination_replaces_local_state() {
        let fake = Arc::new(FakeListing::default());
        let mut listing = ListingController::new(fake, 10);

        let shown = listing.load().await.len();
        assert_eq!(shown, 1);
        assert_eq!(listing.pagination().last_page, 3);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_an_empty_listing() {
        let fake = Arc::new(FakeListing {
            fail: true,
            ..Default::default()
        });
        let mut listing = ListingController::new(fake, 10);

        assert!(listing.load().await.is_empty());
    }
}
