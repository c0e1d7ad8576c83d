use bookmark_service::models::{
    BookmarkContentRequest, BookmarkMutationResponse, BookmarkResponse, Bookmark,
    PopulatedBookmark, User,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

fn sample_response() -> BookmarkResponse {
    BookmarkResponse {
        id: "0192f7d2-0000-4000-8000-000000000000".to_string(),
        author: "alice".to_string(),
        date_created: "April 5th 2023, 3:45:00 pm".to_string(),
        content: "hello".to_string(),
        date_modified: "April 6th 2023, 9:00:00 am".to_string(),
    }
}

#[test]
fn test_bookmark_response_uses_frontend_field_names() {
    let json = serde_json::to_value(sample_response()).unwrap();
    let object = json.as_object().unwrap();

    // The frontend reads `_id` and camelCase dates.
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["_id", "author", "content", "dateCreated", "dateModified"]
    );
    assert!(!object.contains_key("id"));
    assert!(!object.contains_key("date_created"));
}

#[test]
fn test_mutation_response_nests_bookmark() {
    let response = BookmarkMutationResponse {
        message: "Your bookmark was created successfully.".to_string(),
        bookmark: sample_response(),
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["message"], "Your bookmark was created successfully.");
    assert_eq!(json["bookmark"]["_id"], "0192f7d2-0000-4000-8000-000000000000");
}

#[test]
fn test_content_request_deserializes() {
    let req: BookmarkContentRequest = serde_json::from_str(r#"{"content":"read me"}"#).unwrap();
    assert_eq!(req.content, "read me");

    // A body without content fails to deserialize; handlers answer it with a 400.
    assert!(serde_json::from_str::<BookmarkContentRequest>("{}").is_err());
}

#[test]
fn test_populated_bookmark_ownership() {
    let author = User {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
    };
    let date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let bookmark = Bookmark {
        id: Uuid::new_v4(),
        author_id: author.id,
        content: "mine".to_string(),
        date_created: date,
        date_modified: date,
    };

    let populated = PopulatedBookmark::new(bookmark.clone(), author.clone());

    assert_eq!(populated.id, bookmark.id);
    assert!(populated.is_owned_by(author.id));
    assert!(!populated.is_owned_by(Uuid::new_v4()));
}
