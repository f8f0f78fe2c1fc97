use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::adapters::http::{error::ApiError, state::HttpState};

const BOUNDARY: &str = "frame";

/// Una parte del flujo `multipart/x-mixed-replace`.
pub fn mjpeg_part(jpeg: &[u8]) -> Bytes {
    let header = format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        BOUNDARY,
        jpeg.len()
    );
    let mut data = header.into_bytes();
    data.extend_from_slice(jpeg);
    data.extend_from_slice(b"\r\n");
    Bytes::from(data)
}

/// Los visores lentos pierden frames en lugar de frenar el bucle.
pub async fn video_feed(State(st): State<HttpState>) -> Response {
    let rx = match st.pipeline.subscribe().await {
        Ok(r) => r,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let stream = BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok((_meta, jpeg)) => Some(Ok::<_, Infallible>(mjpeg_part(&jpeg))),
            Err(_lagged) => None,
        }
    });

    (
        [
            (header::CONTENT_TYPE, format!("multipart/x-mixed-replace; boundary={BOUNDARY}")),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_has_boundary_length_and_trailer() {
        let part = mjpeg_part(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let head = b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 4\r\n\r\n";
        assert!(part.starts_with(head));
        assert_eq!(&part[head.len()..head.len() + 4], &[0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(part.ends_with(b"\r\n"));
    }
}
