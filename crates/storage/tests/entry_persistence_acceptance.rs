use shared::{
    domain::Category,
    worksheet::{LifeCategoriesContent, LifeCategory, PurposeElement, WorksheetContent},
};
use storage::Storage;

#[tokio::test]
async fn entries_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("workbook.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let content = WorksheetContent::LifeCategories(LifeCategoriesContent {
        categories: vec![LifeCategory {
            name: "Health".into(),
            sub_categories: vec!["Sleep".into(), "Running".into()],
        }],
        purpose_elements: vec![PurposeElement {
            name: "Mentoring".into(),
            description: "Help new engineers grow".into(),
        }],
    });

    let user_id = {
        let storage = Storage::new(&database_url).await.expect("db");
        let user = storage
            .create_user("carol@example.com", "hash", "Carol")
            .await
            .expect("create")
            .expect("new user");
        storage
            .upsert_entry(user.user_id, &content)
            .await
            .expect("save");
        user.user_id
    };

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let entry = reopened
        .load_entry(user_id, Category::LifeCategories)
        .await
        .expect("load")
        .expect("entry present");
    let typed = WorksheetContent::from_parts(entry.category, entry.content).expect("typed");
    assert_eq!(typed, content);
}
