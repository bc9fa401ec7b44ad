use std::sync::Arc;
use std::time::Duration;

use recipes_client::dialogs::forms::EDIT_USER_FORM;
use recipes_client::dialogs::session::{RecipeField, TextList};
use recipes_client::dialogs::{DialogError, DialogPhase};
use recipes_client::domain::CatalogEntity;
use recipes_client::domain::types::Role;
use recipes_client::events::Severity;
use recipes_client::services::entity_view::RecipeEditor;
use serde_json::json;

mod common;

use common::{FakeCatalog, test_app};

fn catalog() -> Arc<FakeCatalog> {
    Arc::new(
        FakeCatalog::new()
            .with_recipes(&[
                ("Leek soup", &["soup", "winter"]),
                ("Bread", &["baking"]),
                ("Tomato soup", &["soup"]),
                ("Salad", &[]),
                ("Stew", &["winter"]),
            ])
            .with_user("ann@example.com", Role::Admin)
            .with_user("bo@example.com", Role::User),
    )
}

fn ids<E: CatalogEntity>(items: &[E]) -> Vec<u32> {
    items.iter().filter_map(CatalogEntity::raw_id).collect()
}

/// Lets listener-spawned refreshes run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_browsing_and_searching_recipes() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::Guest, None);

    app.recipes.refresh().await;
    assert_eq!(ids(&app.recipes.items()), vec![1, 2, 3]);
    assert!(app.recipes.can_go_next());
    assert!(!app.recipes.can_go_previous());

    assert!(app.recipes.next().await);
    assert_eq!(ids(&app.recipes.items()), vec![4, 5]);
    assert_eq!(app.recipes.page_number(), 2);
    assert!(!app.recipes.next().await);

    assert!(app.recipes.previous().await);
    assert_eq!(app.recipes.page_number(), 1);

    app.recipes.set_filter_text("soup").await;
    assert_eq!(ids(&app.recipes.items()), vec![1, 3]);
    assert_eq!(
        catalog.requests(),
        vec![
            "GET /recipes?count=3",
            "GET /recipes?count=3&skip=1",
            "GET /recipes?count=3",
            "GET /recipes?count=3&query=soup",
        ]
    );
}

#[tokio::test]
async fn test_search_from_a_later_page_steps_back() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::Guest, None);

    app.recipes.refresh().await;
    app.recipes.next().await;
    app.recipes.set_filter_text("soup").await;

    assert_eq!(app.recipes.page_number(), 1);
    assert_eq!(ids(&app.recipes.items()), vec![1, 3]);
    assert_eq!(
        catalog.requests()[2..],
        [
            "GET /recipes?count=3&skip=1&query=soup",
            "GET /recipes?count=3&query=soup",
        ]
    );

    app.recipes.clear_filter().await;
    assert_eq!(ids(&app.recipes.items()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_creating_a_recipe_through_the_dialog() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::User, Some(7));
    let surface = app.notification_surface();

    app.recipes.request_create(&app.dialogs).await.unwrap();
    assert_eq!(
        app.forms.create_recipe.tag_suggestions(),
        vec!["baking", "soup", "winter"]
    );

    app.dialogs
        .edit(|session| {
            let recipe = session.as_recipe_mut().unwrap();
            recipe.set_field(RecipeField::Title, "  Chili ");
            recipe.push_text(TextList::Tags, "spicy");
            recipe.push_text(TextList::Tags, "spicy");
        })
        .unwrap();
    app.dialogs.close(true).await.unwrap();

    let created = catalog.recipe(8).unwrap();
    assert_eq!(created["title"], json!("Chili"));
    assert_eq!(created["tags"], json!(["spicy"]));
    assert_eq!(surface.visible(Severity::Success).as_deref(), Some("Chili created"));
    assert!(app.recipes.items().is_empty());
    assert_eq!(app.dialogs.phase(), DialogPhase::Idle);
}

#[tokio::test]
async fn test_editing_and_deleting_recipe_details() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::Moderator, Some(6));
    let _mounted = app.mount();
    let surface = app.notification_surface();
    app.recipes.refresh().await;

    let details = app.recipe_details();
    assert!(details.load(1).await);
    assert!(details.can_edit());

    assert!(details.edit(&app.dialogs, RecipeEditor::Ingredients).await.unwrap());
    app.dialogs
        .edit(|session| {
            session
                .as_recipe_mut()
                .unwrap()
                .push_text(TextList::Ingredients, "3 leeks");
        })
        .unwrap();
    assert!(details.entity().unwrap().ingredients.is_empty());
    app.dialogs.close(true).await.unwrap();

    let saved = details.entity().unwrap();
    assert_eq!(saved.revision, 2);
    assert_eq!(saved.ingredients, vec!["3 leeks"]);
    assert_eq!(catalog.recipe(1).unwrap()["revision"], json!(2));
    assert_eq!(surface.visible(Severity::Success).as_deref(), Some("Leek soup saved"));

    assert!(details.delete(true).await);
    settle().await;

    assert_eq!(details.entity(), None);
    assert!(catalog.recipe(1).is_none());
    assert_eq!(ids(&app.recipes.items()), vec![2, 3, 4]);
    assert_eq!(surface.visible(Severity::Success).as_deref(), Some("Leek soup deleted"));
}

#[tokio::test]
async fn test_admin_manages_users() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::Admin, Some(6));
    let _mounted = app.mount();
    let surface = app.notification_surface();

    app.users.refresh().await;
    let users = app.users.items();
    assert_eq!(ids(&users), vec![6, 7]);

    let card = app.user_card(users[1].clone());
    assert!(card.can_edit());
    card.edit(&app.dialogs, EDIT_USER_FORM).await.unwrap();
    app.dialogs
        .edit(|session| session.as_user_mut().unwrap().set_role(Role::Moderator))
        .unwrap();
    app.dialogs.close(true).await.unwrap();
    assert_eq!(card.entity().unwrap().role, Role::Moderator);
    assert_eq!(
        surface.visible(Severity::Success).as_deref(),
        Some("Moderator bo@example.com saved")
    );

    assert!(card.delete(true).await);
    settle().await;
    assert_eq!(ids(&app.users.items()), vec![6]);

    app.users.request_create(&app.dialogs).await.unwrap();
    app.dialogs
        .edit(|session| {
            let user = session.as_user_mut().unwrap();
            user.set_email(" Cy@Example.com");
            user.set_role(Role::User);
        })
        .unwrap();
    app.dialogs.close(true).await.unwrap();

    let users = app.users.items();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].email, "cy@example.com");
    assert_eq!(catalog.user_count(), 2);
    assert_eq!(surface.visible(Severity::Success).as_deref(), Some("User cy@example.com created"));
}

#[tokio::test]
async fn test_guests_get_no_forms() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::Guest, None);

    let result = app.recipes.request_create(&app.dialogs).await;

    assert!(matches!(result, Err(DialogError::UnknownDialog(_))));
    assert!(catalog.requests().is_empty());
}

#[tokio::test]
async fn test_only_one_dialog_at_a_time() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::User, Some(7));
    let details = app.recipe_details();
    details.load(2).await;

    details.edit(&app.dialogs, RecipeEditor::Info).await.unwrap();
    let refused = app.recipes.request_create(&app.dialogs).await;
    assert_eq!(refused, Err(DialogError::Busy { phase: DialogPhase::Open }));

    app.dialogs.close(false).await.unwrap();
    assert_eq!(catalog.requests(), vec!["GET /recipes/2"]);
    assert_eq!(app.dialogs.phase(), DialogPhase::Idle);
}

#[tokio::test]
async fn test_failures_surface_as_error_notifications() {
    let catalog = catalog();
    let app = test_app(&catalog, Role::Guest, None);
    let surface = app.notification_surface();

    catalog.fail_next();
    app.recipes.refresh().await;

    assert!(app.recipes.items().is_empty());
    assert!(!app.recipes.is_busy());
    assert_eq!(
        surface.visible(Severity::Error).as_deref(),
        Some("Failed to communicate with server :(")
    );
}
