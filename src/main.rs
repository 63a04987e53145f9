mod api;
mod error;
mod form;
mod store;
mod website;

#[macro_use]
extern crate rocket;

use std::path::PathBuf;

use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::fs::NamedFile;
use rocket::{Build, Rocket, State};

use store::Store;

#[launch]
fn rocket() -> _ {
    build(rocket::Config::figment())
}

fn build(figment: Figment) -> Rocket<Build> {
    let rocket = rocket::custom(figment)
        .attach(Store::fairing())
        .attach(assets_fairing())
        .mount("/", routes![static_file]);
    let rocket = api::mount(rocket);
    website::mount(rocket)
}

fn assets_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Assets Config", |rocket| async {
        let assets_dir = rocket
            .figment()
            .extract_inner::<PathBuf>("assets_dir")
            .unwrap_or_else(|_| PathBuf::from("static"));
        if assets_dir.exists() {
            Ok(rocket.manage(AssetsDir(assets_dir)))
        } else {
            log::error!(
                "The assets directory '{}' does not exist.",
                assets_dir.display()
            );

            Err(rocket)
        }
    })
}

#[derive(Debug)]
struct AssetsDir(PathBuf);

#[get("/static/<file..>")]
async fn static_file(file: PathBuf, assets_dir: &State<AssetsDir>) -> Option<NamedFile> {
    NamedFile::open(assets_dir.0.join(file)).await.ok()
}

#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use rocket::local::blocking::Client;
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    fn client() -> (TempDir, Client) {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("gigbook.sqlite");
        let figment = rocket::Config::figment()
            .merge(("databases.sqlite_database.url", database.display().to_string()))
            .merge(("assets_dir", "static"))
            .merge(("log_level", "off"));

        let client = Client::tracked(build(figment)).unwrap();
        (dir, client)
    }

    fn list_fillmore(client: &Client) {
        let response = client
            .post("/venues/create")
            .header(ContentType::Form)
            .body("name=The+Fillmore&city=San+Francisco&state=CA&genres=Rock&genres=Jazz&phone=")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);
    }

    #[test]
    fn listed_venue_appears_in_the_api() {
        let (_dir, client) = client();
        list_fillmore(&client);

        let home = client.get("/").dispatch();
        assert!(home
            .into_string()
            .unwrap()
            .contains("Venue &quot;The Fillmore&quot; was successfully listed!"));

        let response = client.get("/api/venues").dispatch();
        assert_eq!(response.status(), Status::Ok);
        let venues: Value = response.into_json().unwrap();

        assert_eq!(venues[0]["id"], 1);
        assert_eq!(venues[0]["name"], "The Fillmore");
        assert_eq!(venues[0]["genres"], serde_json::json!(["Rock", "Jazz"]));
        assert_eq!(venues[0]["seeking_talent"], false);
        assert_eq!(venues[0]["phone"], Value::Null);
    }

    #[test]
    fn deleted_venue_page_is_gone() {
        let (_dir, client) = client();
        list_fillmore(&client);

        let page = client.get("/venues/1").dispatch();
        assert_eq!(page.status(), Status::Ok);
        assert!(page.into_string().unwrap().contains("The Fillmore"));

        let deleted = client.post("/venues/1/delete").dispatch();
        assert_eq!(deleted.status(), Status::SeeOther);

        assert_eq!(client.get("/venues/1").dispatch().status(), Status::NotFound);
    }

    #[test]
    fn edited_venue_redirects_to_its_page() {
        let (_dir, client) = client();
        list_fillmore(&client);

        let response = client
            .post("/venues/1/edit")
            .header(ContentType::Form)
            .body("name=The+Fillmore+Live&city=San+Francisco&state=CA&genres=Funk&seeking_talent=true")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/venues/1"));

        let page = client.get("/venues/1").dispatch().into_string().unwrap();
        assert!(page.contains("Venue &quot;The Fillmore Live&quot; was successfully updated!"));
        assert!(page.contains("Currently seeking talent"));
    }

    #[test]
    fn invalid_artist_edit_keeps_the_artist() {
        let (_dir, client) = client();
        client
            .post("/artists/create")
            .header(ContentType::Form)
            .body("name=Guns+N+Petals&city=San+Francisco&state=CA")
            .dispatch();

        let response = client
            .post("/artists/1/edit")
            .header(ContentType::Form)
            .body("name=&city=San+Francisco&state=CA")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/artists/1"));

        let page = client.get("/artists/1").dispatch().into_string().unwrap();
        assert!(page.contains("Artist without a name could not be updated."));
        assert!(page.contains("name is required"));
        assert!(page.contains("<h1>Guns N Petals</h1>"));
    }

    #[test]
    fn deleting_an_unknown_venue_goes_home() {
        let (_dir, client) = client();

        let response = client.post("/venues/9/delete").dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/"));

        let home = client.get("/").dispatch().into_string().unwrap();
        assert!(home.contains("Venue 9 could not be deleted. The venue with id 9 was not found!"));

        let api = client.delete("/api/artists/9").dispatch();
        assert_eq!(api.status(), Status::NotFound);
    }

    #[test]
    fn venue_without_name_is_not_listed() {
        let (_dir, client) = client();

        let response = client
            .post("/venues/create")
            .header(ContentType::Form)
            .body("name=++&city=San+Francisco&state=CA")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);

        let home = client.get("/").dispatch().into_string().unwrap();
        assert!(home.contains("Venue without a name could not be listed."));
        assert!(home.contains("name is required"));

        let venues: Value = client.get("/api/venues").dispatch().into_json().unwrap();
        assert_eq!(venues, serde_json::json!([]));
    }

    #[test]
    fn editing_a_missing_artist_goes_home() {
        let (_dir, client) = client();

        let response = client.get("/artists/7/edit").dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/"));
    }

    #[test]
    fn show_for_missing_venue_conflicts() {
        let (_dir, client) = client();

        let artist = client
            .post("/api/artists")
            .json(&serde_json::json!({
                "name": "Guns N Petals",
                "city": "San Francisco",
                "state": "CA",
                "genres": ["Rock n Roll"],
                "seeking_venue": true
            }))
            .dispatch();
        assert_eq!(artist.status(), Status::Ok);
        let artist_id: i32 = artist.into_json().unwrap();

        let response = client
            .post("/api/shows")
            .json(&serde_json::json!({
                "venue_id": 5,
                "artist_id": artist_id,
                "start_time": "2035-04-01 20:00:00"
            }))
            .dispatch();

        assert_eq!(response.status(), Status::Conflict);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["status"], 409);
    }

    #[test]
    fn booked_show_is_listed() {
        let (_dir, client) = client();
        list_fillmore(&client);
        client
            .post("/artists/create")
            .header(ContentType::Form)
            .body("name=Guns+N+Petals&city=San+Francisco&state=CA&seeking_venue=true")
            .dispatch();

        let response = client
            .post("/shows/create")
            .header(ContentType::Form)
            .body("venue_id=1&artist_id=1&start_time=2035-04-01T20:00")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);

        let shows: Value = client.get("/api/shows").dispatch().into_json().unwrap();
        assert_eq!(shows[0]["venue_name"], "The Fillmore");
        assert_eq!(shows[0]["artist_name"], "Guns N Petals");
        assert_eq!(shows[0]["start_time"], "2035-04-01 20:00:00");

        let page = client.get("/shows").dispatch().into_string().unwrap();
        assert!(page.contains("Sun Apr 1, 2035 8:00PM"));
    }

    #[test]
    fn static_files_are_served() {
        let (_dir, client) = client();

        let response = client.get("/static/main.css").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::CSS));
    }
}
