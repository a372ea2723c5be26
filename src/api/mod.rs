use rocket::Route;

mod answer;
mod candidates;
mod common;
mod friends;
mod quiz;
mod results;
mod user;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(user::routes());
    routes.extend(friends::routes());
    routes.extend(quiz::routes());
    routes.extend(answer::routes());
    routes.extend(candidates::routes());
    routes.extend(results::routes());
    routes
}
