use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Unspecified,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Unspecified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    FishInclusive,
    Keto,
    Paleo,
    LowCarb,
    LowFat,
    Halal,
    Kosher,
    DiabeticFriendly,
    None,
    HighProtein,
    HighFiber,
    Unspecified,
}

impl Default for DietaryPreference {
    fn default() -> Self {
        DietaryPreference::Unspecified
    }
}

impl DietaryPreference {
    /// Short human description shown next to the option in listings.
    pub fn description(&self) -> &'static str {
        match self {
            DietaryPreference::Vegetarian => "No meat, may include dairy/eggs",
            DietaryPreference::Vegan => "No animal products at all",
            DietaryPreference::FishInclusive => "Includes fish but no other meat",
            DietaryPreference::Keto => "Low-carb, high-fat diet",
            DietaryPreference::Paleo => "Whole foods, no grains/dairy",
            DietaryPreference::LowCarb => "Reduced carb intake",
            DietaryPreference::LowFat => "Reduced fat intake",
            DietaryPreference::Halal => "Follows Islamic dietary laws",
            DietaryPreference::Kosher => "Follows Jewish dietary laws",
            DietaryPreference::DiabeticFriendly => "Manages blood sugar",
            DietaryPreference::None => "No restrictions",
            DietaryPreference::HighProtein => "High protein diet",
            DietaryPreference::HighFiber => "High fiber intake",
            DietaryPreference::Unspecified => "Unspecified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    Grams,
    Kilograms,
    Milliliters,
    Liters,
    Teaspoons,
    Tablespoons,
    Cups,
    Pieces,
    Cloves,
    Pinch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit: Unit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub recipe_id: Uuid,
    pub user: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergy {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A recipe as reported by the server. Never mutated locally; the only
/// write path is an explicit create or image-update call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub user: Option<String>,
    pub instructions: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub difficulty: Difficulty,
    pub estimated_calories: u32,
    #[serde(default)]
    pub average_rating: Option<f32>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub allergies: Vec<Allergy>,
}

/// Upper-bound filter thresholds, built fresh for each filtered search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilters {
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub estimated_calories: u32,
    pub difficulty: Difficulty,
    pub dietary_preference: DietaryPreference,
}

impl Default for RecipeFilters {
    fn default() -> Self {
        Self {
            prep_time_minutes: LIMIT_MAX,
            cook_time_minutes: LIMIT_MAX,
            estimated_calories: LIMIT_MAX,
            difficulty: Difficulty::Unspecified,
            dietary_preference: DietaryPreference::Unspecified,
        }
    }
}

// Server-side bean validation caps minute and calorie fields at 2000.
pub const LIMIT_MAX: u32 = 2000;

const INSTRUCTIONS_MIN: usize = 15;
const INSTRUCTIONS_MAX: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRecipeRequest {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub instructions: String,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub difficulty: Difficulty,
    pub estimated_calories: u32,
    pub tags: Vec<Tag>,
    pub allergies: Vec<Allergy>,
    pub dietary_preference: DietaryPreference,
}

impl AddRecipeRequest {
    /// Mirrors the server's validation so obviously bad submissions fail
    /// before a request is made.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("name must not be blank".into()));
        }
        if self.ingredients.is_empty() {
            return Err(ApiError::InvalidRequest(
                "at least one ingredient is required".into(),
            ));
        }
        let len = self.instructions.chars().count();
        if !(INSTRUCTIONS_MIN..=INSTRUCTIONS_MAX).contains(&len) {
            return Err(ApiError::InvalidRequest(format!(
                "instructions must be {INSTRUCTIONS_MIN}..={INSTRUCTIONS_MAX} characters, got {len}"
            )));
        }
        for (label, v) in [
            ("prepTimeMinutes", self.prep_time_minutes),
            ("cookTimeMinutes", self.cook_time_minutes),
            ("estimatedCalories", self.estimated_calories),
        ] {
            if v > LIMIT_MAX {
                return Err(ApiError::InvalidRequest(format!(
                    "{label} must be at most {LIMIT_MAX}, got {v}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecipe {
    pub message: String,
    pub id: Uuid,
}

/// Client-local paging state. `page` and `page_size` drive outgoing
/// requests; `last_page` is whatever the server last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub last_page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn first(page_size: usize) -> Self {
        Self {
            page: 0,
            last_page: 0,
            page_size,
        }
    }
}

/// Response wrapper shared by both search paths: payload plus the
/// server-reported paging metadata, replaced wholesale on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub pagination: Pagination,
}
