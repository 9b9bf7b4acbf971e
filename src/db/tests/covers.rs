use crate::db::*;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_store_and_lookup_by_track_id() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.store_cover("trk1", "Artist", "Song", Some("https://cdn.example/c.jpg"))
        .await
        .unwrap();

    let record = db.cover_for_track("trk1").await.unwrap().unwrap();
    assert_eq!(record.track_id, "trk1");
    assert_eq!(record.cover_url.as_deref(), Some("https://cdn.example/c.jpg"));

    assert!(db.cover_for_track("unknown").await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_lookup_by_metadata_is_case_insensitive() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.store_cover("trk1", "Daft Punk", "Around the World", Some("https://cdn.example/dp.jpg"))
        .await
        .unwrap();

    let record = db
        .cover_by_metadata("daft punk", "AROUND THE WORLD")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.track_id, "trk1");

    db.close().await;
}

#[tokio::test]
async fn test_negative_result_is_cached() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    // NULL cover_url means "looked up, no art exists"
    db.store_cover("trk2", "Artist", "Obscure B-Side", None)
        .await
        .unwrap();

    let record = db.cover_for_track("trk2").await.unwrap();
    let record = record.expect("negative result must still produce a row");
    assert!(record.cover_url.is_none());

    db.close().await;
}

#[tokio::test]
async fn test_store_cover_replaces_existing_row() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.store_cover("trk3", "Artist", "Song", None).await.unwrap();
    db.store_cover("trk3", "Artist", "Song", Some("https://cdn.example/found-later.jpg"))
        .await
        .unwrap();

    let record = db.cover_for_track("trk3").await.unwrap().unwrap();
    assert_eq!(
        record.cover_url.as_deref(),
        Some("https://cdn.example/found-later.jpg")
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM covers WHERE track_id = ?")
        .bind("trk3")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    db.close().await;
}
