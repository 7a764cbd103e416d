use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use platefinder::config::AppConfig;
use platefinder::listing::ListingController;
use platefinder::recipes::dto::{AddRecipeRequest, DietaryPreference, Difficulty, Recipe};
use platefinder::recipes::service::{RecipeSearch, RecipeService};
use platefinder::search::SearchPipeline;
use platefinder::upload::{mime_for_path, select_first, CdnUploader, MediaClient, UploadItem};

#[derive(Parser)]
#[command(name = "platefinder", about = "Recipe discovery client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search recipes by name, or follow stdin line-by-line with --follow
    Search {
        query: Option<String>,
        #[arg(long)]
        follow: bool,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
    },
    /// Browse recipes with filter thresholds and pagination
    Browse {
        #[arg(long)]
        prep_time: Option<u32>,
        #[arg(long)]
        cook_time: Option<u32>,
        #[arg(long)]
        calories: Option<u32>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        diet: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show one recipe in full
    Show { id: Uuid },
    /// Submit a new recipe from a JSON file, optionally with an image
    Add {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Upload an image, optionally attaching it to an existing recipe
    Upload {
        paths: Vec<PathBuf>,
        #[arg(long)]
        recipe: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "platefinder=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let service = RecipeService::new(&config.api);
    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            query,
            follow,
            page,
            size,
        } => {
            let size = size.unwrap_or(config.api.default_page_size);
            if follow {
                follow_search(Arc::new(service), size).await?;
            } else {
                let query = query.context("a query is required unless --follow is set")?;
                let envelope = service.search_by_name(query.trim(), page, size).await?;
                print_recipes(&envelope.data);
                println!(
                    "page {} of {} ({} per page)",
                    envelope.pagination.page,
                    envelope.pagination.last_page,
                    envelope.pagination.page_size
                );
            }
        }
        Command::Browse {
            prep_time,
            cook_time,
            calories,
            difficulty,
            diet,
            page,
            page_size,
        } => {
            let page_size = page_size.unwrap_or(config.api.default_page_size);
            let mut listing = ListingController::new(Arc::new(service), page_size);
            {
                let filters = listing.filters_mut();
                if let Some(v) = prep_time {
                    filters.prep_time_minutes = v;
                }
                if let Some(v) = cook_time {
                    filters.cook_time_minutes = v;
                }
                if let Some(v) = calories {
                    filters.estimated_calories = v;
                }
                if let Some(v) = &difficulty {
                    filters.difficulty = parse_wire_enum::<Difficulty>(v)?;
                }
                if let Some(v) = &diet {
                    filters.dietary_preference = parse_wire_enum::<DietaryPreference>(v)?;
                }
            }
            let diet = listing.filters().dietary_preference;
            println!("dietary preference: {}", diet.description());

            if page > 0 {
                listing.set_page(page, page_size).await;
            } else {
                listing.load().await;
            }
            print_recipes(listing.recipes());
            let p = listing.pagination();
            println!("page {} of {} ({} per page)", p.page, p.last_page, p.page_size);
        }
        Command::Show { id } => {
            let recipe = service.get_by_id(id).await?;
            print_recipe_full(&recipe);
        }
        Command::Add { file, image } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let mut request: AddRecipeRequest =
                serde_json::from_str(&raw).context("parse recipe JSON")?;

            if let Some(path) = image {
                let uploader = CdnUploader::new(&config.cdn);
                let media = upload_path(&uploader, &path).await?;
                request.image_url = Some(media.secure_url);
            }

            let created = service.create(&request).await?;
            println!("{} (id {})", created.message, created.id);
        }
        Command::Upload { paths, recipe } => {
            let path = select_first(&paths).context("no file given")?;
            let uploader = CdnUploader::new(&config.cdn);
            let media = upload_path(&uploader, path).await?;
            println!("{}", media.secure_url);

            if let Some(id) = recipe {
                service.set_image_by_url(id, &media.secure_url).await?;
                println!("attached to recipe {id}");
            }
        }
    }

    Ok(())
}

/// Reads search input line by line and prints results as they arrive.
/// Each line is treated like an edit of the search box, so blank lines
/// clear the listing and repeats are deduplicated.
async fn follow_search(service: Arc<dyn RecipeSearch>, page_size: usize) -> anyhow::Result<()> {
    let pipeline = SearchPipeline::spawn(service, page_size);
    let mut results = pipeline.results();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(text) => pipeline.input(text),
                    None => break,
                }
            }
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = results.borrow_and_update().clone();
                match &current.query {
                    Some(q) => {
                        println!("-- {} result(s) for {q:?}", current.recipes.len());
                        print_recipes(&current.recipes);
                    }
                    None => println!("-- cleared"),
                }
            }
        }
    }
    Ok(())
}

async fn upload_path(
    uploader: &CdnUploader,
    path: &std::path::Path,
) -> anyhow::Result<platefinder::upload::MediaRef> {
    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let item = UploadItem {
        body: body.into(),
        content_type: mime_for_path(path).to_string(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into()),
    };
    Ok(uploader.upload(item).await?)
}

/// Accepts human spellings like "easy" or "low-carb" for the wire enums.
fn parse_wire_enum<T: DeserializeOwned>(value: &str) -> anyhow::Result<T> {
    let wire = value.trim().to_ascii_uppercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(wire.clone()))
        .with_context(|| format!("unknown value {value:?} (wire name {wire})"))
}

fn print_recipes(recipes: &[Recipe]) {
    for r in recipes {
        let rating = r
            .average_rating
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{}  {:?}  prep {}m cook {}m  {} kcal  rating {}",
            r.name, r.difficulty, r.prep_time_minutes, r.cook_time_minutes,
            r.estimated_calories, rating
        );
    }
}

fn print_recipe_full(r: &Recipe) {
    println!("{} ({})", r.name, r.id);
    if let Some(user) = &r.user {
        println!("by {user}");
    }
    println!(
        "{:?}, prep {}m, cook {}m, {} kcal",
        r.difficulty, r.prep_time_minutes, r.cook_time_minutes, r.estimated_calories
    );
    if let Some(url) = &r.image_url {
        println!("image: {url}");
    }
    if !r.ingredients.is_empty() {
        println!("ingredients:");
        for i in &r.ingredients {
            println!("  {} {:?} {}", i.quantity, i.unit, i.name);
        }
    }
    if !r.tags.is_empty() {
        let names: Vec<&str> = r.tags.iter().map(|t| t.name.as_str()).collect();
        println!("tags: {}", names.join(", "));
    }
    if !r.allergies.is_empty() {
        let names: Vec<&str> = r.allergies.iter().map(|a| a.name.as_str()).collect();
        println!("allergies: {}", names.join(", "));
    }
    println!("\n{}", r.instructions);
}
