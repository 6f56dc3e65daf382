use blogdata_core::{Post, PostValidationError};
use chrono::NaiveDate;
use serde_json::json;

fn new_year() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn new_post_generates_unique_ids_and_has_no_version() {
    let first = Post::new("Title", "slug", new_year(), 1, None).unwrap();
    let second = Post::new("Title", "slug", new_year(), 1, None).unwrap();

    assert_ne!(first.id, second.id);
    assert!(first.is_new());
    assert_eq!(first.version, None);
}

#[test]
fn constructor_rejects_blank_fields() {
    assert_eq!(
        Post::with_id(" ", "Title", "slug", new_year(), 1, None).unwrap_err(),
        PostValidationError::BlankId
    );
    assert_eq!(
        Post::with_id("1", "", "slug", new_year(), 1, None).unwrap_err(),
        PostValidationError::BlankTitle
    );
    assert_eq!(
        Post::with_id("1", "Title", "\t", new_year(), 1, None).unwrap_err(),
        PostValidationError::BlankSlug
    );
    assert_eq!(
        Post::with_id("1", "Title", "slug", new_year(), -5, None).unwrap_err(),
        PostValidationError::NegativeTimeToRead(-5)
    );
}

#[test]
fn negative_version_is_invalid() {
    let mut post = Post::with_id("1", "Title", "slug", new_year(), 1, None).unwrap();
    post.version = Some(-1);
    assert_eq!(
        post.validate().unwrap_err(),
        PostValidationError::NegativeVersion(-1)
    );
}

#[test]
fn serializes_with_camel_case_fields() {
    let post = Post::with_id(
        "1234",
        "Hello, World!",
        "hello-world",
        new_year(),
        10,
        Some("Spring Boot".to_string()),
    )
    .unwrap();

    let value = serde_json::to_value(&post).unwrap();
    assert_eq!(
        value,
        json!({
            "id": "1234",
            "title": "Hello, World!",
            "slug": "hello-world",
            "date": "2024-01-01",
            "timeToRead": 10,
            "tags": "Spring Boot",
            "version": null,
        })
    );

    let decoded: Post = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, post);
}
