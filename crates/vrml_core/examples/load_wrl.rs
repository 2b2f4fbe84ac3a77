//! Example: Load and inspect a VRML file.
//!
//! Run with: cargo run --example load_wrl -- model.wrl

use std::env;

use vrml_core::{read_vrml_file, SceneConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: load_wrl <path-to-wrl-file>");
        println!("\nExample:");
        println!("  cargo run --example load_wrl -- model.wrl");
        return;
    }

    let path = &args[1];
    println!("Loading VRML file: {}", path);

    match read_vrml_file(path, &SceneConfig::default()) {
        Ok(scene) => {
            print!("{}", scene.dump());

            let info = scene.world_info();
            if !info.title.is_empty() {
                println!("\nTitle: {}", info.title);
            }

            match scene.shape_with_appearances() {
                (Some(shape), appearances) => {
                    let bounds = shape.bounds();
                    println!("\n--- Shape ---");
                    println!("  Faces: {}", shape.face_count());
                    println!("  Polylines: {}", shape.wire_count());
                    println!("  Faces with appearance: {}", appearances.len());
                    println!(
                        "  Bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
                        bounds.x.min, bounds.y.min, bounds.z.min,
                        bounds.x.max, bounds.y.max, bounds.z.max
                    );
                }
                (None, _) => println!("\nNo geometry in scene"),
            }
        }
        Err(e) => {
            eprintln!("Error loading VRML file: {}", e);
        }
    }
}
