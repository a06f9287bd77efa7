//! Dumps the metadata directories of the TIFF files given on the command
//! line, one named entry per line.

use std::fs::File;
use std::io::BufReader;

fn main() -> exifread::ExifResult<()> {
    for path in std::env::args_os().skip(1) {
        let file = BufReader::new(File::open(&path)?);
        let metadata = exifread::parse(file, 0)?;

        for dir in &metadata.directories {
            print!("{dir}");
        }
        if let Some((lat, lon)) = metadata.gps_coords() {
            println!("position: {lat:.6}, {lon:.6}");
        }
        for warning in &metadata.warnings {
            eprintln!("warning: {warning}");
        }
    }
    Ok(())
}
