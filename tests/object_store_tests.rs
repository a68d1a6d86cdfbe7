
use car_listings_backend::repositories::{
    local_store::LocalObjectStore,
    object_store::{ObjectHandle, ObjectStore, StorageError},
};

use test_utils::{jpeg_bytes, TestStorage, PUBLIC_BASE_URL};

#[actix_rt::test]
async fn test_put_get_delete_roundtrip() {
    let storage = TestStorage::new();
    let store = storage.store();
    let path = "images/owner/photo";

    let handle = store.put(path, &jpeg_bytes()).await.unwrap();
    assert_eq!(handle.path, path);
    assert_eq!(handle.size, jpeg_bytes().len() as u64);

    let url = store.get_url(&handle).await.unwrap();
    assert_eq!(url, format!("{}{}", PUBLIC_BASE_URL, path));

    assert_eq!(store.get(path).await.unwrap(), jpeg_bytes());

    store.delete(path).await.unwrap();
    assert!(matches!(store.get(path).await, Err(StorageError::NotFound(_))));
    assert!(matches!(store.delete(path).await, Err(StorageError::NotFound(_))));
}

#[actix_rt::test]
async fn test_url_of_missing_object_is_not_found() {
    let storage = TestStorage::new();
    let store = storage.store();

    let handle = ObjectHandle {
        path: "images/owner/missing".into(),
        size: 0,
    };

    assert!(matches!(store.get_url(&handle).await, Err(StorageError::NotFound(_))));
}

#[actix_rt::test]
async fn test_paths_escaping_the_root_are_rejected() {
    let storage = TestStorage::new();
    let store = storage.store();

    for path in ["", "../outside", "/etc/passwd", "images//double", "images\\win", "images/./x"] {
        let result = store.put(path, b"x").await;
        assert!(
            matches!(result, Err(StorageError::InvalidPath(_))),
            "path {:?} should be rejected",
            path
        );
    }

    assert!(!storage.root.exists());
}

#[test]
fn test_base_url_without_trailing_slash_keeps_last_segment() {
    let store = LocalObjectStore::new("/tmp/unused", "https://cdn.example.com/media").unwrap();
    assert_eq!(store.public_base_url.as_str(), "https://cdn.example.com/media/");

    assert!(matches!(
        LocalObjectStore::new("/tmp/unused", "not a url"),
        Err(StorageError::UrlResolution(_))
    ));
}
