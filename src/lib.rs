#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod voting;

/// Build the server from `Rocket.toml` and the environment.
pub async fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

/// Attach everything the server needs to a bare rocket.
fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .manage(api::Started::now())
        .mount("/", api::routes())
        .register("/", api::catchers())
}

#[cfg(test)]
pub(crate) const TEST_JWT_SECRET: &str = "test-secret-do-not-use-in-production";

/// A server using the given store, configured for tests.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: store::Store) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("jwt_secret", TEST_JWT_SECRET))
        .merge(("store", "memory"))
        .merge(("log_level", "off"));
    assemble(rocket::custom(figment).manage(store))
}
