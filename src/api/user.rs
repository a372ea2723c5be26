use log::info;
use mongodb::bson::{doc, DateTime};
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::api::common::{current_user, pseudo_taken, touch, visible_user_by_pseudo};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{
            check_pseudo, hash_password, AuthToken, LoginRequest, SignupRequest,
            AUTH_TOKEN_COOKIE,
        },
        user::{PublicUser, UserDescription, UserUpdate},
    },
    common::QuizDefinition,
    db::user::{NewUser, User},
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![
        create_anonymous,
        signup,
        login,
        logout,
        me,
        update,
        public_profile
    ]
}

/// Start a session for a first-time visitor.
#[post("/user")]
pub async fn create_anonymous(
    cookies: &CookieJar<'_>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let user = User {
        id: Id::new(),
        user: NewUser::new_anonymous(),
    };
    users.insert_one(&user, None).await?;
    info!("Created anonymous user {}", user.id);

    cookies.add(AuthToken::new(&user).into_cookie(config));
    Ok(Json(UserDescription::new(user, config)))
}

#[post("/user/signup", data = "<request>", format = "json")]
pub async fn signup(
    token: Option<AuthToken>,
    request: Json<SignupRequest>,
    cookies: &CookieJar<'_>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    request.validate().map_err(Error::bad_request)?;
    let pseudo = request.pseudo.trim();
    if users.find_one(doc! { "pseudo": pseudo }, None).await?.is_some() {
        return Err(Error::bad_request("Pseudo already taken"));
    }
    let password_hash = hash_password(&request.password)?;

    // Claim the anonymous user making the request, if there is one.
    let anonymous = match token {
        Some(token) => users
            .find_one(token.id.as_doc(), None)
            .await?
            .filter(|user| !user.is_claimed()),
        None => None,
    };

    let user = match anonymous {
        Some(mut user) => {
            let now = DateTime::now();
            users
                .update_one(
                    user.id.as_doc(),
                    doc! {
                        "$set": {
                            "pseudo": pseudo,
                            "password_hash": &password_hash,
                            "updated_at": now,
                            "last_login_at": now,
                        }
                    },
                    None,
                )
                .await
                .map_err(pseudo_taken)?;
            user.pseudo = Some(pseudo.to_string());
            user.password_hash = Some(password_hash);
            info!("Claimed user {} as '{pseudo}'", user.id);
            user
        }
        None => {
            let user = User {
                id: Id::new(),
                user: NewUser::new_claimed(pseudo.to_string(), password_hash),
            };
            users.insert_one(&user, None).await.map_err(pseudo_taken)?;
            info!("Signed up user {} as '{pseudo}'", user.id);
            user
        }
    };

    cookies.add(AuthToken::new(&user).into_cookie(config));
    Ok(Json(UserDescription::new(user, config)))
}

#[post("/user/login", data = "<credentials>", format = "json")]
pub async fn login(
    credentials: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let unauthorized = || {
        Error::Status(
            Status::Unauthorized,
            "No user found with the provided pseudo and password combination.".to_string(),
        )
    };

    let user = users
        .find_one(doc! { "pseudo": credentials.pseudo.trim() }, None)
        .await?
        .ok_or_else(unauthorized)?;
    if !user.verify_password(&credentials.password)? {
        return Err(unauthorized());
    }
    users
        .update_one(
            user.id.as_doc(),
            doc! { "$set": { "last_login_at": DateTime::now() } },
            None,
        )
        .await?;

    cookies.add(AuthToken::new(&user).into_cookie(config));
    Ok(Json(UserDescription::new(user, config)))
}

#[post("/user/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[get("/user/me")]
pub async fn me(
    token: AuthToken,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let user = current_user(&token, &users).await?;
    users
        .update_one(
            user.id.as_doc(),
            doc! { "$set": { "last_login_at": DateTime::now() } },
            None,
        )
        .await?;
    Ok(Json(UserDescription::new(user, config)))
}

#[put("/user", data = "<update>", format = "json")]
pub async fn update(
    token: AuthToken,
    update: Json<UserUpdate>,
    users: Coll<User>,
    quiz: &State<QuizDefinition>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    if let Some(pseudo) = &update.pseudo {
        check_pseudo(pseudo).map_err(Error::bad_request)?;
        if !token.claimed {
            return Err(Error::bad_request("Sign up to choose a pseudo"));
        }
    }
    if let Some(themes) = &update.themes {
        if let Some(unknown) = themes.iter().find(|id| quiz.theme(id).is_none()) {
            return Err(Error::bad_request(format!("Unknown theme '{unknown}'")));
        }
    }

    users
        .update_one(token.id.as_doc(), touch(update.to_set_doc()), None)
        .await
        .map_err(pseudo_taken)?;

    let user = current_user(&token, &users).await?;
    Ok(Json(UserDescription::new(user, config)))
}

#[get("/user/<pseudo>")]
pub async fn public_profile(pseudo: &str, users: Coll<User>) -> Result<Json<PublicUser>> {
    let user = visible_user_by_pseudo(pseudo, &users).await?;
    Ok(Json(user.into()))
}
