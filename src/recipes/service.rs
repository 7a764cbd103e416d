use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::instrument;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;

use super::dto::{
    AddRecipeRequest, CreatedRecipe, Envelope, Pagination, Recipe, RecipeFilters,
};

/// The two read paths the interactive pipelines run on. A trait object so
/// the pipelines and their tests can swap in a fake.
#[async_trait]
pub trait RecipeSearch: Send + Sync {
    async fn search_by_name(
        &self,
        name: &str,
        page: usize,
        size: usize,
    ) -> Result<Envelope<Vec<Recipe>>, ApiError>;

    async fn find_by_filter(
        &self,
        filters: &RecipeFilters,
        pagination: &Pagination,
    ) -> Result<Envelope<Vec<Recipe>>, ApiError>;
}

#[derive(Clone)]
pub struct RecipeService {
    http: reqwest::Client,
    base_url: String,
}

impl RecipeService {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/api/v1/recipe", config.base_url.trim_end_matches('/')),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Recipe, ApiError> {
        let resp = self
            .http
            .get(format!("{}/byId/{id}", self.base_url))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        expect_json(resp).await
    }

    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        pagination: &Pagination,
    ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/all", self.base_url))
            .query(&[
                ("pageNumber", pagination.page),
                ("pageSize", pagination.page_size),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        expect_json(resp).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: &AddRecipeRequest) -> Result<CreatedRecipe, ApiError> {
        request.validate()?;
        let resp = self
            .http
            .post(format!("{}/create", self.base_url))
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        expect_json(resp).await
    }

    #[instrument(skip(self))]
    pub async fn set_image_by_url(&self, id: Uuid, url: &str) -> Result<Recipe, ApiError> {
        let resp = self
            .http
            .patch(format!("{}/uploadImage/byUrl/{id}", self.base_url))
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        expect_json(resp).await
    }
}

#[async_trait]
impl RecipeSearch for RecipeService {
    #[instrument(skip(self))]
    async fn search_by_name(
        &self,
        name: &str,
        page: usize,
        size: usize,
    ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/byName", self.base_url))
            .query(&[("name", name)])
            .query(&[("page", page), ("size", size)])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        expect_json(resp).await
    }

    #[instrument(skip(self, filters))]
    async fn find_by_filter(
        &self,
        filters: &RecipeFilters,
        pagination: &Pagination,
    ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
        let resp = self
            .http
            .post(format!("{}/byFilter", self.base_url))
            .query(&[
                ("pageNumber", pagination.page),
                ("pageSize", pagination.page_size),
            ])
            .header(ACCEPT, "application/json")
            .json(filters)
            .send()
            .await?;
        expect_json(resp).await
    }
}

async fn expect_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status));
    }
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}
