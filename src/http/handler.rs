use std::sync::Arc;

use thiserror::Error;

use crate::fs::{DocumentRoot, ResolveError, ResolvedTarget};
use crate::fs::resolver::INDEX_FILE;
use crate::http::listing::{HtmlListing, ListingRenderer};
use crate::http::mime;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The handling task panicked or was cancelled.
    #[error("request handling aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Turns a parsed request into a response by serving files from the
/// document root.
///
/// Cloning is cheap; the listing renderer is shared.
#[derive(Clone)]
pub struct RequestHandler {
    root: DocumentRoot,
    listing: Arc<dyn ListingRenderer>,
}

impl RequestHandler {
    pub fn new(root: DocumentRoot) -> Self {
        Self::with_listing(root, Arc::new(HtmlListing))
    }

    pub fn with_listing(root: DocumentRoot, listing: Arc<dyn ListingRenderer>) -> Self {
        Self { root, listing }
    }

    pub fn root(&self) -> &DocumentRoot {
        &self.root
    }

    /// Handles one request.
    ///
    /// Missing or unreadable targets become 404. An error is only returned
    /// for unexpected I/O failures, which the caller answers with a 500.
    pub async fn handle(&self, request: &Request) -> Result<Response, HandlerError> {
        if !request.is_read_only() {
            return Ok(ResponseBuilder::standard(StatusCode::MethodNotAllowed)
                .reason("Method not allowed")
                .build());
        }

        let response = match self.root.resolve(&request.target).await? {
            ResolvedTarget::File { name, contents, .. } => {
                self.content(&request.method, &name, contents)
            }
            ResolvedTarget::Directory {
                request_path,
                entries,
                ..
            } => {
                let labels: Vec<String> = entries.iter().map(|e| e.label()).collect();
                let page = self.listing.render(&request_path, &labels);
                self.content(&request.method, INDEX_FILE, page)
            }
            ResolvedTarget::NotFound => ResponseBuilder::standard(StatusCode::NotFound)
                .reason("File not found")
                .build(),
        };

        Ok(response)
    }

    /// 200 response for `contents` served under `name`. HEAD keeps the
    /// length a GET would report but drops the body.
    fn content(&self, method: &Method, name: &str, contents: Vec<u8>) -> Response {
        let builder = ResponseBuilder::standard(StatusCode::Ok)
            .header("Content-Length", contents.len().to_string())
            .header("Content-Type", mime::content_type(name));

        match method {
            Method::HEAD => builder.build(),
            _ => builder.body(contents).build(),
        }
    }
}
