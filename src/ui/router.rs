use std::collections::{BTreeMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

use crate::error::RouterError;

const NOT_FOUND_PAGE: &str = "404.html";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Dynamic(String),
    CatchAll(String),
    OptionalCatchAll(String),
}

impl Segment {
    fn parse(path: &str, raw: &str) -> Result<Self, RouterError> {
        let malformed = || RouterError::MalformedSegment {
            path: path.to_string(),
            segment: raw.to_string(),
        };

        let segment = if let Some(name) = raw.strip_prefix("[[...").and_then(|s| s.strip_suffix("]]")) {
            Segment::OptionalCatchAll(name.to_string())
        } else if let Some(name) = raw.strip_prefix("[...").and_then(|s| s.strip_suffix(']')) {
            Segment::CatchAll(name.to_string())
        } else if let Some(name) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Segment::Dynamic(name.to_string())
        } else {
            Segment::Static(raw.to_string())
        };

        let name = match &segment {
            Segment::Static(name) => {
                if name.contains(['[', ']']) {
                    return Err(malformed());
                }
                return Ok(segment);
            }
            Segment::Dynamic(name) | Segment::CatchAll(name) | Segment::OptionalCatchAll(name) => name,
        };
        if name.is_empty() || name.contains(['[', ']', '.']) {
            return Err(malformed());
        }
        Ok(segment)
    }
}

#[derive(Debug, Default)]
struct Node {
    page: Option<String>,
    children: BTreeMap<String, Node>,
    dynamic: Option<(String, Box<Node>)>,
    /// (slug, file, optional)
    catch_all: Option<(String, String, bool)>,
}

impl Node {
    fn insert(&mut self, path: &str, segments: &[Segment], file: String) -> Result<(), RouterError> {
        let Some((head, rest)) = segments.split_first() else {
            if self.page.is_some() {
                return Err(RouterError::DuplicateRoute(path.to_string()));
            }
            self.page = Some(file);
            return Ok(());
        };

        match head {
            Segment::Static(name) => self
                .children
                .entry(name.clone())
                .or_default()
                .insert(path, rest, file),
            Segment::Dynamic(name) => {
                let (existing, child) = self
                    .dynamic
                    .get_or_insert_with(|| (name.clone(), Box::default()));
                if *existing != *name {
                    return Err(RouterError::ConflictingSlug {
                        path: path.to_string(),
                        existing: existing.clone(),
                        new: name.clone(),
                    });
                }
                child.insert(path, rest, file)
            }
            Segment::CatchAll(name) | Segment::OptionalCatchAll(name) => {
                if !rest.is_empty() {
                    return Err(RouterError::CatchAllNotLast(path.to_string()));
                }
                let optional = matches!(head, Segment::OptionalCatchAll(_));
                if let Some((existing, _, _)) = &self.catch_all {
                    return Err(RouterError::ConflictingSlug {
                        path: path.to_string(),
                        existing: existing.clone(),
                        new: name.clone(),
                    });
                }
                self.catch_all = Some((name.clone(), file, optional));
                Ok(())
            }
        }
    }

    fn resolve(&self, segments: &[&str]) -> Option<&str> {
        let Some((head, rest)) = segments.split_first() else {
            return self.page.as_deref().or(match &self.catch_all {
                Some((_, file, true)) => Some(file.as_str()),
                _ => None,
            });
        };

        if let Some(found) = self.children.get(*head).and_then(|c| c.resolve(rest)) {
            return Some(found);
        }
        if let Some(found) = self.dynamic.as_ref().and_then(|(_, c)| c.resolve(rest)) {
            return Some(found);
        }
        self.catch_all.as_ref().map(|(_, file, _)| file.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(String),
    NotFound,
    BadRequest,
}

/// Serves a statically exported Next.js site from an embedded file tree.
///
/// `.html` files are routes: `index.html` maps to its directory, `[id]` is a
/// dynamic segment, `[...slug]` a catch-all and `[[...slug]]` an optional
/// catch-all. Any other file is served at its exact path.
pub struct NextRouter<E> {
    files: HashSet<String>,
    root: Node,
    not_found: Option<String>,
    _assets: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> NextRouter<E> {
    pub fn new() -> Result<Self, RouterError> {
        let mut files = HashSet::new();
        let mut root = Node::default();

        for path in E::iter() {
            let path = path.into_owned();
            if let Some(route) = path.strip_suffix(".html") {
                let mut segments = route
                    .split('/')
                    .map(|raw| Segment::parse(&path, raw))
                    .collect::<Result<Vec<_>, _>>()?;
                if segments.last() == Some(&Segment::Static("index".to_string())) {
                    segments.pop();
                }
                root.insert(&path, &segments, path.clone())?;
            }
            files.insert(path);
        }

        let not_found = files.contains(NOT_FOUND_PAGE).then(|| NOT_FOUND_PAGE.to_string());
        log::debug!("[UI] router built over {} embedded files", files.len());

        Ok(Self {
            files,
            root,
            not_found,
            _assets: PhantomData,
        })
    }

    pub fn resolve(&self, path: &str) -> Resolved {
        let mut decoded = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            match urlencoding::decode(raw) {
                Ok(segment) => decoded.push(segment),
                Err(_) => return Resolved::BadRequest,
            }
        }
        let segments: Vec<&str> = decoded.iter().map(|s| s.as_ref()).collect();
        if segments
            .iter()
            .any(|s| *s == "." || *s == ".." || s.contains('\\') || s.contains('/'))
        {
            return Resolved::BadRequest;
        }

        let joined = segments.join("/");
        if !joined.is_empty() && self.files.contains(&joined) {
            return Resolved::File(joined);
        }

        match self.root.resolve(&segments) {
            Some(file) => Resolved::File(file.to_string()),
            None => Resolved::NotFound,
        }
    }

    pub fn serve(&self, path: &str) -> Response {
        match self.resolve(path) {
            Resolved::File(file) => file_response::<E>(&file, StatusCode::OK),
            Resolved::NotFound => match &self.not_found {
                Some(page) => file_response::<E>(page, StatusCode::NOT_FOUND),
                None => StatusCode::NOT_FOUND.into_response(),
            },
            Resolved::BadRequest => StatusCode::BAD_REQUEST.into_response(),
        }
    }
}

impl<E: RustEmbed + 'static> NextRouter<E> {
    /// Wraps the router in an axum fallback handler. Only `GET` and `HEAD`
    /// are served; other routers can be merged in front of it.
    pub fn into_router<S>(self) -> axum::Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let router = Arc::new(self);
        axum::Router::new()
            .fallback(serve_asset::<E>)
            .with_state(router)
    }
}

async fn serve_asset<E: RustEmbed + 'static>(
    State(router): State<Arc<NextRouter<E>>>,
    method: Method,
    uri: Uri,
) -> Response {
    match method {
        Method::GET => router.serve(uri.path()),
        Method::HEAD => {
            let (parts, _) = router.serve(uri.path()).into_parts();
            Response::from_parts(parts, Body::empty())
        }
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response(),
    }
}

fn file_response<E: RustEmbed>(path: &str, status: StatusCode) -> Response {
    let Some(file) = E::get(path) else {
        log::error!("[UI] embedded file {} disappeared", path);
        return StatusCode::NOT_FOUND.into_response();
    };

    let content_type = if path.ends_with(".html") {
        "text/html; charset=utf-8".to_string()
    } else {
        mime_guess::from_path(path).first_or_octet_stream().to_string()
    };

    (
        status,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(file.data.into_owned()),
    )
        .into_response()
}
