//! Static page content for the routes that have no map.

use airmap_core::Route;

pub fn home() -> String {
    let mut out = String::from(
        "airmap — air quality at any point on the map\n\n\
         Satellite observations are combined with local sensors to give an\n\
         up-to-date picture of the air you breathe.\n\n\
         How it works\n\
         \x20 01  Select your location: click anywhere on the map.\n\
         \x20 02  Get instant analysis: PM2.5, NO2, ozone and other pollutants.\n\
         \x20 03  Take action: follow the health recommendations.\n\n",
    );
    out.push_str(&links());
    out
}

pub fn about() -> String {
    let mut out = String::from(
        "About airmap\n\n\
         \x20 Real-time analysis      pollutant levels for the point you pick.\n\
         \x20 Health recommendations  advice tailored to current conditions.\n\
         \x20 Global coverage         any coordinate on the map.\n\
         \x20 Data visualization      trend charts and colour-coded indicators.\n\n",
    );
    out.push_str(&links());
    out
}

fn links() -> String {
    let mut out = String::from("Pages:\n");
    for route in Route::all() {
        out.push_str(&format!("  {:<12} airmap open {}\n", route.title(), route.path()));
    }
    out
}
