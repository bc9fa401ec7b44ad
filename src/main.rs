//! Lists the first page of recipes, optionally filtered by the text given on
//! the command line.

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;

use recipes_client::App;
use recipes_client::api::http::HttpApiClient;
use recipes_client::events::Severity;
use recipes_client::models::config::ClientConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let client_config = match ClientConfig::load() {
        Ok(client_config) => client_config,
        Err(err) => {
            log::error!("Error loading client config: {}", err);
            std::process::exit(1);
        }
    };

    let api = match HttpApiClient::new(&client_config.api_base_url, client_config.request_timeout())
    {
        Ok(api) => api,
        Err(err) => {
            log::error!("Error creating API client: {}", err);
            std::process::exit(1);
        }
    };

    let app = match App::new(client_config, Arc::new(api)) {
        Ok(app) => app,
        Err(err) => {
            log::error!("Error building application: {}", err);
            std::process::exit(1);
        }
    };
    let _mounted = app.mount();
    let surface = app.notification_surface();

    let search = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if search.is_empty() {
        app.recipes.refresh().await;
    } else {
        app.recipes.set_filter_text(search).await;
    }

    if let Some(error) = surface.visible(Severity::Error) {
        log::error!("{error}");
        std::process::exit(1);
    }

    let recipes = app.recipes.items();
    log::info!(
        "Page {} of recipes, {} shown",
        app.recipes.page_number(),
        recipes.len()
    );
    for recipe in recipes {
        let id = recipe.id.map(|id| id.to_string()).unwrap_or_default();
        if recipe.tags.is_empty() {
            println!("{id:>5}  {}", recipe.title);
        } else {
            println!("{id:>5}  {}  [{}]", recipe.title, recipe.formatted_tags());
        }
    }
}
