use edu_portal::storage::{
    MockStorageService, S3StorageClient, StorageService, is_allowed_material_type, sanitize_key,
};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_upload_and_download_urls() {
        let mock = MockStorageService::new();

        let upload = mock
            .presign_upload("materials/notes.pdf", "application/pdf")
            .await
            .unwrap();
        assert!(upload.contains("signature=fake"));
        assert!(upload.contains("materials/notes.pdf"));
        assert!(upload.ends_with("method=put"));

        let download = mock.presign_download("materials/notes.pdf").await.unwrap();
        assert!(download.ends_with("method=get"));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        assert!(mock.presign_upload("a.pdf", "application/pdf").await.is_err());
        assert!(mock.presign_download("a.pdf").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock.presign_download("../../etc/passwd").await.unwrap();
        assert!(!url.contains(".."));
    }
}

#[test]
fn test_sanitize_key() {
    assert_eq!(sanitize_key("materials/../../secret"), "materials/secret");
    assert_eq!(sanitize_key("/materials//./a.pdf"), "materials/a.pdf");
}

#[test]
fn test_allowed_material_types() {
    assert!(is_allowed_material_type("application/pdf"));
    assert!(is_allowed_material_type("video/mp4"));
    assert!(!is_allowed_material_type("application/x-msdownload"));
    assert!(!is_allowed_material_type("text/html"));
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_presigns_without_network() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        // Presigning is computed locally; nothing is sent to the endpoint.
        let url = client
            .presign_upload("materials/a.pdf", "application/pdf")
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/testbucket/materials/a.pdf"));
        assert!(url.contains("X-Amz-Signature"));
    }
}
