mod common;

use axum::http::{Method, StatusCode};
use common::{movie_json, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_signup_login_and_profile() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({ "name": "  neo  ", "email": "Neo@Matrix.io", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["name"], "neo");
    assert_eq!(body["user"]["email"], "neo@matrix.io");
    assert_eq!(body["user"]["role"], "customer");
    assert_eq!(body["user"]["favorites"], json!([]));

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "neo@matrix.io", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "neo");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "neo@matrix.io", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_signup_conflicts_and_validation() {
    let app = spawn_app().await;
    app.signup("trinity", "trinity@matrix.io").await;

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({ "name": "someone", "email": "TRINITY@matrix.io", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "EMAIL_ALREADY_EXISTS");

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({ "name": "trinity", "email": "other@matrix.io", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "USERNAME_TAKEN");

    let (status, body) = app
        .post("/api/auth/signup", None, json!({ "name": "morpheus" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_FIELDS");

    let (status, _) = app
        .post(
            "/api/auth/signup",
            None,
            json!({ "name": "morpheus", "email": "m@matrix.io", "password": "123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_errors() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/movies", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");

    let (status, body) = app.get("/api/movies", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_admin_only_movie_insert() {
    let app = spawn_app().await;
    let user = app.signup("viewer", "viewer@cinevault.test").await;
    let admin = app.admin().await;

    let movie = movie_json("603", "The Matrix", &["Action"], &["movie"], "1999-03-31");

    let (status, body) = app.add_movie(&user, movie.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "ADMIN_ONLY");

    let (status, body) = app.add_movie(&admin, movie.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "603");
    assert_eq!(body["data"]["backdropPath"], "/posters/603.jpg");
    assert_eq!(body["data"]["categories"], json!(["Action"]));

    let mut duplicate = movie_json("603", "Not The Matrix", &["Drama"], &["movie"], "2000-01-01");
    duplicate["tmdbId"] = json!(603);
    let (status, body) = app.add_movie(&admin, duplicate).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "MOVIE_ALREADY_EXISTS");

    let (status, body) = app.get("/api/movies/603", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "The Matrix");

    let (status, body) = app
        .add_movie(&admin, json!({ "tmdbId": "604", "title": "Reloaded" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_FIELDS");
}

#[tokio::test]
async fn test_catalog_queries() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    for i in 1..=12 {
        let genre: &[&str] = if i % 3 == 0 { &["Action"] } else { &["Drama"] };
        let kind: &[&str] = if i == 1 { &["series"] } else { &["movie"] };
        let (status, _) = app
            .add_movie(
                &admin,
                movie_json(
                    &format!("{i}"),
                    &format!("Title {i}"),
                    genre,
                    kind,
                    &format!("2020-01-{i:02}"),
                ),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get("/api/movies", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"].as_array().unwrap().len(), 10);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["totalMovies"], 12);
    assert_eq!(body["movies"][0]["id"], "1");

    let (_, body) = app.get("/api/movies?page=2", Some(&admin)).await;
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert_eq!(body["currentPage"], 2);

    let (_, body) = app.get("/api/movies?page=-3", Some(&admin)).await;
    assert_eq!(body["currentPage"], 1);

    // Category filters are unpaginated and case-insensitive
    let (_, body) = app.get("/api/movies?category=action", Some(&admin)).await;
    assert_eq!(body["movies"].as_array().unwrap().len(), 4);
    assert!(body.get("currentPage").is_none());
    assert!(body.get("totalMovies").is_none());

    let (_, body) = app
        .get("/api/movies?category=SERIES&filterType=type", Some(&admin))
        .await;
    assert_eq!(body["movies"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/movies?loadAll=true", Some(&admin)).await;
    assert_eq!(body["movies"].as_array().unwrap().len(), 12);
    assert!(body.get("totalPages").is_none());

    let (_, body) = app.get("/api/movies?sort=latest", Some(&admin)).await;
    assert_eq!(body["movies"][0]["id"], "12");

    let (_, body) = app.get("/api/movies?search=title%201", Some(&admin)).await;
    // "Title 1", "Title 10", "Title 11", "Title 12"
    assert_eq!(body["totalMovies"], 4);

    let (status, body) = app.get("/api/movies/by-type/series", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], "1");

    let (status, body) = app.get("/api/genres", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genres"], json!(["Action", "Drama"]));
}

#[tokio::test]
async fn test_favorites_and_watch_history() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    for id in ["10", "20", "30"] {
        app.add_movie(&admin, movie_json(id, &format!("Movie {id}"), &["Drama"], &["movie"], "2021-05-01"))
            .await;
    }
    let token = app.signup("morpheus", "morpheus@matrix.io").await;

    let (status, body) = app
        .post("/api/users/favorites/20", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Added to favorites");
    assert_eq!(body["data"]["favorites"], json!(["20"]));

    app.post("/api/users/favorites/10", Some(&token), json!({})).await;
    let (_, body) = app.get("/api/users/favorites", Some(&token)).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["20", "10"]);

    let (_, body) = app
        .post("/api/users/favorites/20", Some(&token), json!({}))
        .await;
    assert_eq!(body["message"], "Removed from favorites");
    assert_eq!(body["data"]["favorites"], json!(["10"]));

    let (status, body) = app
        .post("/api/users/favorites/999", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "MOVIE_NOT_FOUND");

    for id in ["10", "20", "30", "10"] {
        let (status, _) = app
            .post(&format!("/api/users/watch-history/{id}"), Some(&token), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = app.get("/api/users/watch-history", Some(&token)).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["10", "30", "20"]);

    let (status, _) = app
        .request(Method::DELETE, "/api/users/watch-history", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/users/watch-history", Some(&token)).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_update_username_and_change_password() {
    let app = spawn_app().await;
    app.signup("taken", "taken@matrix.io").await;
    let token = app.signup("oracle", "oracle@matrix.io").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/users/me/username",
            Some(&token),
            Some(json!({ "newUsername": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_FIELDS");

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/users/me/username",
            Some(&token),
            Some(json!({ "newUsername": "oracle" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/users/me/username",
            Some(&token),
            Some(json!({ "newUsername": "taken" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "USERNAME_TAKEN");

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/users/me/username",
            Some(&token),
            Some(json!({ "newUsername": "the-oracle" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "the-oracle");

    let (status, body) = app
        .post(
            "/api/auth/change-password",
            Some(&token),
            json!({ "currentPassword": "nope-nope", "newPassword": "brand-new-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");

    let (status, _) = app
        .post(
            "/api/auth/change-password",
            Some(&token),
            json!({ "currentPassword": "secret123", "newPassword": "brand-new-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "oracle@matrix.io", "password": "brand-new-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_google_login() {
    let app = spawn_app().await;
    app.signup("existing", "existing@matrix.io").await;

    let (status, body) = app
        .post(
            "/api/auth/google/token",
            None,
            json!({ "token": "google:sub-1:smith@matrix.io:Agent Smith" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "agentsmith");
    let first_id = body["user"]["id"].clone();

    // Same Google account logs into the same user
    let (status, body) = app
        .post(
            "/api/auth/google/verify",
            None,
            json!({ "token": "google:sub-1:smith@matrix.io:Agent Smith" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], first_id);

    // Display name collision gets a four digit suffix
    let (_, body) = app
        .post(
            "/api/auth/google/token",
            None,
            json!({ "token": "google:sub-2:smith2@matrix.io:Agent Smith" }),
        )
        .await;
    let name = body["user"]["name"].as_str().unwrap();
    assert!(name.starts_with("agentsmith"));
    assert_eq!(name.len(), "agentsmith".len() + 4);

    let (status, body) = app
        .post(
            "/api/auth/google/token",
            None,
            json!({ "token": "google:sub-3:existing@matrix.io:Existing" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "EMAIL_REGISTERED_WITH_PASSWORD");

    let (status, _) = app
        .post("/api/auth/google/token", None, json!({ "token": "garbage" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_is_literal_substring() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    app.add_movie(&admin, movie_json("194", "Amélie", &["Comedy"], &["movie"], "2001-04-25"))
        .await;
    app.add_movie(&admin, movie_json("949", "Heat", &["Crime"], &["movie"], "1995-12-15"))
        .await;

    let (_, body) = app.get("/api/movies?search=AM%C3%89LIE", Some(&admin)).await;
    assert_eq!(body["totalMovies"], 1);
    assert_eq!(body["movies"][0]["id"], "194");

    for wildcard in ["H_at", "%25"] {
        let (status, body) = app
            .get(&format!("/api/movies?search={wildcard}"), Some(&admin))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalMovies"], 0, "search={wildcard}");
        assert_eq!(body["movies"], json!([]));
    }
}

#[tokio::test]
async fn test_out_of_range_page_is_empty() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    app.add_movie(&admin, movie_json("1", "Only", &["Drama"], &["movie"], "2020-01-01"))
        .await;

    let (status, body) = app
        .get("/api/movies?page=9223372036854775807", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"], json!([]));
    assert_eq!(body["currentPage"], 9_223_372_036_854_775_807_u64);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["totalMovies"], 1);

    let (status, body) = app
        .get("/api/movies?page=9223372036854775807&search=only", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"], json!([]));
    assert_eq!(body["totalMovies"], 1);
}
