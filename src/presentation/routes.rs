use crate::presentation::auth::{
    change_password, change_password_page, edit_profile, login, login_page, logout, register,
    register_page,
};
use crate::presentation::handlers::{
    add_to_favourites, add_to_watchlist, browse_movies, browse_tv_shows, favourites, find_movie,
    find_tv_show, health_check, remove_from_favourites, remove_from_watchlist, search,
    search_page, watchlist,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        // Accounts
        .route("/register", web::get().to(register_page))
        .route("/register", web::post().to(register))
        .route("/login", web::get().to(login_page))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(logout))
        .route("/edit-profile", web::get().to(edit_profile))
        .route("/change-password", web::get().to(change_password_page))
        .route("/change-password", web::post().to(change_password))
        // Lists
        .route("/watchlist", web::get().to(watchlist))
        .route("/favourites", web::get().to(favourites))
        .route("/add-to-watchlist", web::get().to(add_to_watchlist))
        .route("/remove-from-watchlist", web::get().to(remove_from_watchlist))
        .route("/add-to-favourites", web::get().to(add_to_favourites))
        .route("/remove-from-favourites", web::get().to(remove_from_favourites))
        // Catalog
        .route("/", web::get().to(search_page))
        .route("/search", web::get().to(search_page))
        .route("/search", web::post().to(search))
        .route("/movie", web::get().to(browse_movies))
        .route("/movie/", web::get().to(browse_movies))
        .route("/tv-show", web::get().to(browse_tv_shows))
        .route("/find", web::get().to(find_movie))
        .route("/find-tv-shows", web::get().to(find_tv_show));
}
