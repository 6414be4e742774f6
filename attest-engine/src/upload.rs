use std::sync::Arc;

use attest_api::client::AssessmentApi;

use crate::error::EngineError;

/// Extensions accepted by the evidence upload form
const ACCEPTED_EXTENSIONS: [&str; 5] = ["pdf", "doc", "docx", "xls", "xlsx"];

/// Uploads evidence files for the question currently on screen
pub struct Uploader {
    api: Arc<dyn AssessmentApi>,
}

impl Uploader {
    pub fn new(api: Arc<dyn AssessmentApi>) -> Self {
        Uploader { api }
    }

    /// Whether the file name carries an accepted extension
    pub fn is_accepted(file_name: &str) -> bool {
        std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                ACCEPTED_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Upload one file and return the stable path to attach
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, EngineError> {
        if !Self::is_accepted(file_name) {
            return Err(EngineError::UploadRejected {
                file_name: file_name.to_string(),
            });
        }

        let path = self
            .api
            .upload_response_file(file_name, bytes)
            .await
            .map_err(|source| EngineError::UploadFailed { source })?;
        tracing::debug!(file_name, %path, "evidence uploaded");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_extensions() {
        assert!(Uploader::is_accepted("evidence.pdf"));
        assert!(Uploader::is_accepted("evidence.PDF"));
        assert!(Uploader::is_accepted("policy.doc"));
        assert!(Uploader::is_accepted("policy.docx"));
        assert!(Uploader::is_accepted("list.xls"));
        assert!(Uploader::is_accepted("list.xlsx"));
    }

    #[test]
    fn test_rejected_extensions() {
        assert!(!Uploader::is_accepted("malware.exe"));
        assert!(!Uploader::is_accepted("archive.tar.gz"));
        assert!(!Uploader::is_accepted("photo.png"));
        assert!(!Uploader::is_accepted("no-extension"));
        assert!(!Uploader::is_accepted(""));
    }
}
