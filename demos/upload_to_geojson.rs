extern crate geojson;
extern crate geoupload;

use geojson::GeoJson;
use geoupload::{process_upload, UploadBundle, UploadEntry};
use std::{env, fs};

/// Usage: `upload_to_geojson <file>... [output]`
///
/// The files form one upload, e.g. `roads.shp roads.shx roads.dbf roads.prj`
/// or a single `.geojson`. The layer is written as GeoJSON to `output`
/// (a path ending in `.out.geojson`) or to stdout.
pub fn main() {
    let mut paths: Vec<String> = env::args().skip(1).collect();
    let output = match paths.last() {
        Some(p) if p.ends_with(".out.geojson") => paths.pop(),
        _ => None,
    };

    let bundle: UploadBundle = paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).expect("Unable to read file");
            UploadEntry::new(path.as_str(), bytes)
        })
        .collect();

    let layer = process_upload(bundle).expect("Unable to process upload");
    for warning in layer.warnings() {
        eprintln!("warning: {}", warning);
    }
    eprintln!(
        "{} features, fields: {}",
        layer.len(),
        layer.fields().join(", ")
    );

    let geojson_string = GeoJson::FeatureCollection(layer.to_geojson()).to_string();
    match output {
        Some(path) => fs::write(path, geojson_string).expect("Unable to write file"),
        None => println!("{}", geojson_string),
    }
}
