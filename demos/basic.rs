//! A small JSON API behind logging, CORS, bearer auth and static files.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/search?q=alice
//!   curl -X POST http://localhost:3000/users \
//!        -H 'authorization: Bearer s3cret' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42 -H 'authorization: Bearer s3cret'
//!   curl -i -X OPTIONS http://localhost:3000/users

use std::sync::Arc;

use trellis::middleware::{
    AllowOrigin, AuthOptions, BearerAuth, Cors, CorsOptions, Logger, Static, StaticOptions,
};
use trellis::{
    Context, Error, Method, Middleware, Next, Request, Response, Router, Server, StatusCode,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let cors = CorsOptions::default()
        .origin(AllowOrigin::list(["http://localhost:8080"]))
        .credentials(true);

    let auth = Arc::new(BearerAuth::new(
        AuthOptions::default().validate(|token| async move { token == "s3cret" }),
    ));

    let app = Router::new()
        .middleware(Logger::default())
        .middleware(Cors::new(cors))
        .middleware(Static::new(StaticOptions::default().dir("public")))
        // Reads stay public; anything that mutates needs a token.
        .middleware(move |req: Request, next: Next| {
            let auth = Arc::clone(&auth);
            async move {
                if *req.method() == Method::GET {
                    return next.run().await;
                }
                auth.call(req, next).await
            }
        })
        .get("/users/:id", get_user)
        .get("/search", search)
        .post("/users", create_user)
        .delete("/users/:id", delete_user);

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/:id
async fn get_user(ctx: Context) -> Response {
    let id = ctx.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// GET /search?q=...
async fn search(ctx: Context) -> Response {
    match ctx.query("q") {
        Some(q) => Response::json(format!(r#"{{"query":"{q}","hits":[]}}"#).into_bytes()),
        None => Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .text("missing ?q="),
    }
}

// POST /users
//
// The body is raw bytes; decode it with whatever the application prefers.
async fn create_user(ctx: Context) -> Result<Response, Error> {
    let body = ctx.text().map_err(Error::handler)?;
    if body.is_empty() {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    }

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#.to_owned().into_bytes()))
}

// DELETE /users/:id
async fn delete_user(_ctx: Context) -> Response {
    Response::status(StatusCode::NO_CONTENT)
}
