use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use menuhub_api::app::services::{AppServices, Backends};
use menuhub_auth::Hs256TokenCodec;
use menuhub_catalog::PricingRules;
use menuhub_infra::{InMemoryBlobStore, InMemoryStore, LogNotifier};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    blobs: Arc<InMemoryBlobStore>,
    notifier: Arc<LogNotifier>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, over in-memory backends we can inspect.
        let store = Arc::new(InMemoryStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let notifier = Arc::new(LogNotifier::new(tracing::Span::none()));
        let services = AppServices::new(Backends {
            credentials: store.clone(),
            catalog: store.clone(),
            orders: store,
            blobs: blobs.clone(),
            notifier: notifier.clone(),
            tokens: Arc::new(Hs256TokenCodec::new(JWT_SECRET, None)),
            pricing: PricingRules::default(),
        });
        let app = menuhub_api::app::router(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            blobs,
            notifier,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.delete(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn post_form(&self, path: &str, token: &str, form: Form) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn put_form(&self, path: &str, token: &str, form: Form) -> (StatusCode, Value) {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    /// Branch "Central" plus the given category and one subcategory in it.
    /// Returns `(branch_id, subcategory_id)`.
    async fn seed_catalog(&self, token: &str, category: &str) -> (i64, i64) {
        let (status, branch) = self
            .post_json("/api/admin/branch", Some(token), json!({ "name": "Central", "city": "Bishkek" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{branch}");
        let (status, cat) = self
            .post_json("/api/admin/category", Some(token), json!({ "name": category }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{cat}");
        let (status, sub) = self
            .post_json(
                "/api/admin/subcategory",
                Some(token),
                json!({ "name": "Classic", "category": cat["id"] }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{sub}");
        (branch["id"].as_i64().unwrap(), sub["id"].as_i64().unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

fn mint_token(id: i64, is_admin: bool) -> String {
    let claims = json!({
        "id": id,
        "is_admin": is_admin,
        "iat": Utc::now().timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn admin_token() -> String {
    mint_token(1, true)
}

fn customer_token() -> String {
    mint_token(2, false)
}

fn product_form(name: &str, branch: i64, subcategory: i64) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("branch", branch.to_string())
        .text("subcategory", subcategory.to_string())
}

fn image(file_name: &str, content_type: &str) -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a])
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .unwrap()
}

#[tokio::test]
async fn root_lists_endpoints() {
    let srv = TestServer::spawn().await;
    for path in ["/", "/api", "/api/"] {
        let (status, body) = srv.get(path, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available_endpoints"]["admin"]["login"], "/api/admin/login");
    }
}

#[tokio::test]
async fn admin_namespace_requires_a_valid_token() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/api/admin/branches", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_required");

    let (status, body) = srv.get("/api/admin/branches", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = srv.get("/api/admin/branches", Some(&admin_token())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn customer_token_reads_admin_data_but_cannot_write() {
    let srv = TestServer::spawn().await;
    let customer = customer_token();

    let (status, _) = srv.get("/api/admin/categories", Some(&customer)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .post_json("/api/admin/branch", Some(&customer), json!({ "name": "X", "city": "Y" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let res = srv
        .client
        .put(srv.url("/api/admin/branch/1"))
        .bearer_auth(&customer)
        .json(&json!({ "name": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_registration_and_login() {
    let srv = TestServer::spawn().await;

    let (status, creds) = srv.post_json("/api/admin/register", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let username = creds["username"].as_str().unwrap().to_string();
    let password = creds["password"].as_str().unwrap().to_string();
    assert!(username.starts_with("admin_"));
    assert_eq!(password.len(), 8);

    let (status, body) = srv
        .post_json("/api/admin/login", None, json!({ "username": username, "password": password }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], username.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    // The issued token is an admin token.
    let (status, _) = srv
        .post_json("/api/admin/branch", Some(&token), json!({ "name": "Central", "city": "Bishkek" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = srv
        .post_json("/api/admin/login", None, json!({ "username": username, "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = srv
        .post_json("/api/admin/login", None, json!({ "username": "admin_nobody", "password": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv.post_json("/api/admin/login", None, json!({ "username": username })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["password"].is_array());

    let (status, _) = srv.get("/api/admin/login", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, users) = srv.get("/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users[0]["username"], username.as_str());
}

#[tokio::test]
async fn customer_registration_and_login() {
    let srv = TestServer::spawn().await;

    let (status, info) = srv.get("/api/auth/register", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["required_fields"], json!(["email", "phone", "password"]));

    let registration = json!({ "email": "a@b.com", "phone": "+1234567890", "password": "p1" });
    let (status, body) = srv.post_json("/api/auth/register", None, registration.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "a");

    let (status, body) = srv.post_json("/api/auth/register", None, registration).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "customer with this email already exists");

    let (status, body) = srv
        .post_json("/api/auth/register", None, json!({ "email": "bad", "phone": "1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());

    let (status, body) = srv
        .post_json("/api/auth/login", None, json!({ "email": "a@b.com", "password": "p1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = srv
        .post_json("/api/auth/login", None, json!({ "email": "a@b.com", "password": "p2" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customer_management_requires_admin_principal() {
    let srv = TestServer::spawn().await;
    srv.post_json(
        "/api/auth/register",
        None,
        json!({ "email": "a@b.com", "phone": "+1", "password": "p1" }),
    )
    .await;

    let (status, _) = srv.get("/api/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = srv.get("/api/users", Some(&customer_token())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_token();
    let (status, users) = srv.get("/api/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users[0]["email"], "a@b.com");
    assert!(users[0].get("password_hash").is_none());

    let id = users[0]["id"].as_i64().unwrap();
    let (status, _) = srv.delete(&format!("/api/users/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = srv.delete(&format!("/api/users/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pizza_products_take_variant_prices() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, sub) = srv.seed_catalog(&admin, "Pizza").await;

    let (status, body) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Margherita", branch, sub).text("price", "10"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Margherita", branch, sub)
                .text("prices", r#"{"small": 10, "medium": 12, "large": 15}"#),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["price"].is_null());
    assert!(!body["prices"]["large"].is_null());
    assert_eq!(body["branch"]["name"], "Central");
    assert_eq!(body["subcategory"]["name"], "Classic");

    // Admin product reads need no token.
    let id = body["id"].as_i64().unwrap();
    let (status, fetched) = srv.get(&format!("/api/admin/product/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Margherita");

    let (status, listed) = srv.get("/api/public/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn moving_a_product_into_pizza_requires_prices() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, drinks) = srv.seed_catalog(&admin, "Drinks").await;

    let (status, pizza) = srv
        .post_json("/api/admin/category", Some(&admin), json!({ "name": "пицца" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, pizza_sub) = srv
        .post_json(
            "/api/admin/subcategory",
            Some(&admin),
            json!({ "name": "Folded", "category": pizza["id"] }),
        )
        .await;
    let pizza_sub = pizza_sub["id"].as_i64().unwrap();

    let (status, created) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Calzone", branch, drinks).text("price", "5"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let id = created["id"].as_i64().unwrap();

    let (status, _) = srv
        .put_form(
            &format!("/api/admin/product/{id}"),
            &admin,
            Form::new().text("subcategory", pizza_sub.to_string()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = srv
        .put_form(
            &format!("/api/admin/product/{id}"),
            &admin,
            Form::new()
                .text("subcategory", pizza_sub.to_string())
                .text("prices", r#"{"small": "8", "medium": "10", "large": "12"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{moved}");
    assert!(moved["price"].is_null());
    assert!(moved["prices"].is_object());
}

#[tokio::test]
async fn product_images_are_checked_and_released() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, sub) = srv.seed_catalog(&admin, "Drinks").await;

    let (status, _) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Cola", branch, sub)
                .text("price", "1.50")
                .part("image", image("cola.gif", "image/gif")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(srv.blobs.is_empty());

    let (status, body) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Cola", branch, sub)
                .text("price", "1.50")
                .part("image", image("cola.png", "image/png")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["image"].as_str().unwrap().starts_with("/media/products/"));
    assert_eq!(srv.blobs.len(), 1);

    let id = body["id"].as_i64().unwrap();
    let (status, _) = srv.delete(&format!("/api/admin/product/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(srv.blobs.is_empty());
}

#[tokio::test]
async fn failed_image_release_keeps_the_product() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, sub) = srv.seed_catalog(&admin, "Drinks").await;

    let (_, body) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Cola", branch, sub)
                .text("price", "1")
                .part("image", image("cola.webp", "image/webp")),
        )
        .await;
    let id = body["id"].as_i64().unwrap();

    srv.blobs.set_fail_deletes(true);
    let (status, body) = srv.delete(&format!("/api/admin/product/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");

    let (status, _) = srv.get(&format!("/api/admin/product/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deletes_are_blocked_by_dependents() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, sub) = srv.seed_catalog(&admin, "Drinks").await;

    let (_, categories) = srv.get("/api/admin/categories", Some(&admin)).await;
    let category = categories[0]["id"].as_i64().unwrap();
    let (status, body) = srv.delete(&format!("/api/admin/category/{category}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    let (_, product) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Cola", branch, sub).text("price", "1"),
        )
        .await;
    let product = product["id"].as_i64().unwrap();
    let (status, _) = srv.delete(&format!("/api/admin/subcategory/{sub}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = srv.delete(&format!("/api/admin/branch/{branch}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    let (_, branches) = srv.get("/api/admin/branches", Some(&admin)).await;
    assert!(branches.as_array().unwrap().iter().any(|b| b["id"] == branch));
    let (status, body) = srv.get(&format!("/api/admin/product/{product}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["branch"]["id"], branch);

    let (status, body) = srv.delete("/api/admin/branch/abc", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn product_writes_with_unknown_references_are_not_found() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, sub) = srv.seed_catalog(&admin, "Drinks").await;

    let (status, body) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Cola", 404, sub).text("price", "1"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "branch not found");

    let (_, created) = srv
        .post_form(
            "/api/admin/product",
            &admin,
            product_form("Cola", branch, sub).text("price", "1"),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = srv
        .put_form(
            &format!("/api/admin/product/{id}"),
            &admin,
            Form::new().text("subcategory", "405"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "subcategory not found");

    let (_, body) = srv.get(&format!("/api/admin/product/{id}"), None).await;
    assert_eq!(body["subcategory"]["id"], sub);
}

#[tokio::test]
async fn prices_beyond_two_decimals_are_rejected() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let (branch, sub) = srv.seed_catalog(&admin, "Drinks").await;

    for price in ["0.001", "123456789012.5"] {
        let (status, body) = srv
            .post_form(
                "/api/admin/product",
                &admin,
                product_form("Cola", branch, sub).text("price", price),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}");
        assert_eq!(body["error"], "validation_error");
    }

    let (_, products) = srv.get("/api/admin/products", None).await;
    assert_eq!(products.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unreadable_bodies_get_json_errors() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let res = srv
        .client
        .post(srv.url("/api/auth/register"))
        .body("email=a@b.com")
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = srv
        .post_json("/api/admin/product", Some(&admin), json!({ "name": "Cola" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn promo_codes_reach_known_customers_only() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    srv.post_json(
        "/api/auth/register",
        None,
        json!({ "email": "a@b.com", "phone": "+1", "password": "p1", "name": "Aida" }),
    )
    .await;

    let (status, _) = srv
        .post_json("/api/admin/promo", Some(&admin), json!({ "promoCode": "SAVE10", "username": "ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv
        .post_json("/api/users/promo", Some(&admin), json!({ "promoCode": "SAVE10", "username": "a" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "promo code SAVE10 sent to a@b.com");
    assert_eq!(srv.notifier.sent().len(), 1);

    srv.notifier.fail_with(Some("smtp unreachable"));
    let (status, body) = srv
        .post_json("/api/admin/promo", Some(&admin), json!({ "promoCode": "SAVE10", "username": "a" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("smtp unreachable"));
}

#[tokio::test]
async fn orders_record_customer_when_token_is_usable() {
    let srv = TestServer::spawn().await;
    let order = json!({
        "name": "Aida",
        "phone": "+996555000000",
        "delivery_method": "pickup",
        "cart": [{ "product": 1, "quantity": 2 }],
    });

    let (status, placed) = srv.post_json("/api/orders", Some(&customer_token()), order.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["user"], 2);

    // A broken token on a best-effort path is ignored.
    let (status, placed) = srv.post_json("/api/orders", Some("garbage"), order).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(placed["user"].is_null());

    let (status, body) = srv
        .post_json(
            "/api/orders",
            None,
            json!({ "name": "Aida", "phone": "1", "delivery_method": "delivery", "cart": [1] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["address"].is_array());

    let (status, orders) = srv.get("/api/admin/orders", Some(&admin_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 2);
}
