use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use iron::headers::{AccessControlAllowOrigin, ContentType};
use iron::status::{self, Status};
use iron::{AfterMiddleware, Handler, IronError, IronResult, Request, Response};
use log::{debug, info};
use router::{NoRoute, Router, TrailingSlash};
use rustc_serialize::json::{Json, ToJson};

use crate::error::StoreError;
use crate::model::{Post, PostFields};
use crate::store::PostStore;

/// Match a `Result` into its inner value or
/// return `500 Internal Server Error` with the error text as JSON.
macro_rules! try_handler {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => {
                let body = single_key("error", e.to_string());
                return Ok(json_response(status::InternalServerError, &body));
            }
        }
    };
}

/// Match a store `Result` into its inner value or
/// return the JSON error response for the `StoreError`.
macro_rules! try_store {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => {
                debug!("rejected request: {}", e);
                return Ok(error_response(&e));
            }
        }
    };
}

/// Lock a `Mutex`. A poisoned lock turns into a 500 for this request
/// instead of taking the worker thread down.
macro_rules! lock {
    ( $e:expr ) => {
        try_handler!($e.lock())
    };
}

/// Get the `:id` segment of the URI as a post id.
/// Anything but plain digits is treated like an unknown route.
macro_rules! get_post_id {
    ( $r:expr ) => {
        match $r.extensions.get::<Router>().and_then(|params| params.find("id")) {
            Some(raw) => match parse_id(raw) {
                Some(id) => id,
                None => return Err(IronError::new(NoRoute, status::NotFound)),
            },
            None => {
                let body = single_key("error", "missing route parameters".to_string());
                return Ok(json_response(status::InternalServerError, &body));
            }
        }
    };
}

fn parse_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn json_response<T: ToJson + ?Sized>(status: Status, value: &T) -> Response {
    Response::with((status, value.to_json().to_string()))
}

fn error_response(err: &StoreError) -> Response {
    json_response(err.status(), err)
}

fn posts_json(posts: &[Post]) -> Json {
    Json::Array(posts.iter().map(ToJson::to_json).collect())
}

fn single_key(key: &str, text: String) -> Json {
    let mut object = BTreeMap::new();
    object.insert(key.to_string(), Json::String(text));
    Json::Object(object)
}

fn read_body(req: &mut Request) -> std::io::Result<String> {
    let mut payload = String::new();
    req.body.read_to_string(&mut payload)?;
    Ok(payload)
}

/// First value of a query string parameter, form-decoded.
fn query_param(req: &Request, name: &str) -> Option<String> {
    let query = req.url.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub struct Handlers {
    pub list: ListHandler,
    pub create: CreateHandler,
    pub find: FindHandler,
    pub update: UpdateHandler,
    pub delete: DeleteHandler,
    pub search: SearchHandler,
    pub sort: SortHandler,
}

impl Handlers {
    pub fn new(store: PostStore) -> Handlers {
        let store = Arc::new(Mutex::new(store));
        Handlers {
            list: ListHandler { store: store.clone() },
            create: CreateHandler { store: store.clone() },
            find: FindHandler { store: store.clone() },
            update: UpdateHandler { store: store.clone() },
            delete: DeleteHandler { store: store.clone() },
            search: SearchHandler { store: store.clone() },
            sort: SortHandler { store },
        }
    }
}

#[derive(Clone)]
pub struct ListHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for ListHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        let store = lock!(self.store);
        Ok(json_response(status::Ok, &posts_json(store.posts())))
    }
}

#[derive(Clone)]
pub struct CreateHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for CreateHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let payload = try_handler!(read_body(req));
        let fields = try_store!(PostFields::from_json(&payload));

        let post = try_store!(lock!(self.store).create(fields));
        info!("created post {}", post.id());

        Ok(json_response(status::Created, &post))
    }
}

#[derive(Clone)]
pub struct FindHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for FindHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let store = lock!(self.store);
        let post = try_store!(store.find(id).ok_or(StoreError::NotFound(id)));
        Ok(json_response(status::Ok, post))
    }
}

#[derive(Clone)]
pub struct UpdateHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for UpdateHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        // Unknown ids are reported before the body is looked at.
        if lock!(self.store).find(id).is_none() {
            return Ok(error_response(&StoreError::NotFound(id)));
        }

        let payload = try_handler!(read_body(req));
        let fields = try_store!(PostFields::from_json(&payload));

        let mut store = lock!(self.store);
        let posts = try_store!(store.update(id, fields));
        info!("updated post {}", id);

        Ok(json_response(status::Ok, &posts_json(posts)))
    }
}

#[derive(Clone)]
pub struct DeleteHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for DeleteHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        try_store!(lock!(self.store).delete(id));
        info!("deleted post {}", id);

        let body = single_key("message", format!("Post {} deleted successfully.", id));
        Ok(json_response(status::Ok, &body))
    }
}

#[derive(Clone)]
pub struct SearchHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for SearchHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let term = query_param(req, "query").unwrap_or_default();

        let results = lock!(self.store).search(&term);
        debug!("search {:?} matched {} posts", term, results.len());

        Ok(json_response(status::Ok, &posts_json(&results)))
    }
}

#[derive(Clone)]
pub struct SortHandler {
    store: Arc<Mutex<PostStore>>,
}

impl Handler for SortHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let field = query_param(req, "sort").unwrap_or_else(|| "title".to_string());
        let direction = query_param(req, "direction").unwrap_or_else(|| "asc".to_string());

        let sorted = try_store!(lock!(self.store).sorted(&field, &direction));
        Ok(json_response(status::Ok, &posts_json(&sorted)))
    }
}

/// Turns the router's "no route" and "trailing slash" errors into the JSON
/// 404 clients expect. Must be linked before the other after-middleware so
/// they see a response.
pub struct NotFoundAfterMiddleware;

impl AfterMiddleware for NotFoundAfterMiddleware {
    fn catch(&self, _: &mut Request, err: IronError) -> IronResult<Response> {
        if err.error.is::<NoRoute>() || err.error.is::<TrailingSlash>() {
            let body = single_key("error", "please check url".to_string());
            Ok(json_response(status::NotFound, &body))
        } else {
            Err(err)
        }
    }
}

pub struct JsonAfterMiddleware;

impl AfterMiddleware for JsonAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        res.headers.set(ContentType::json());
        Ok(res)
    }
}

/// Lets a browser client served from any origin call the API.
pub struct CorsAfterMiddleware;

impl AfterMiddleware for CorsAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        res.headers.set(AccessControlAllowOrigin::Any);
        res.headers.set_raw("Access-Control-Allow-Methods", vec![b"GET, POST, PUT, DELETE, OPTIONS".to_vec()]);
        res.headers.set_raw("Access-Control-Allow-Headers", vec![b"Content-Type".to_vec()]);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iron::Headers;
    use iron_test::{request, response};
    use std::thread;

    #[test]
    fn ids_are_plain_digits() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("+1"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id(" 1"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn poisoned_store_answers_json_500() {
        let handlers = Handlers::new(PostStore::seeded());
        let store = handlers.list.store.clone();
        let _ = thread::spawn(move || {
            let _guard = store.lock().unwrap();
            panic!("worker died holding the store");
        })
        .join();

        let res = request::get("http://localhost:5002/api/posts", Headers::new(), &handlers.list).unwrap();
        assert_eq!(res.status, Some(status::InternalServerError));

        let body = Json::from_str(&response::extract_body_to_string(res)).unwrap();
        assert!(body["error"].as_string().unwrap().contains("poisoned"));
    }
}
