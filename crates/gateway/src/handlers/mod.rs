//! API handlers module

pub mod health;
pub mod jobs;
pub mod recipes;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// Build a file download response
pub fn attachment(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_headers() {
        let response = attachment("selected_skus.csv", "text/csv", b"a,b\n".to_vec());

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"selected_skus.csv\""
        );
    }
}
