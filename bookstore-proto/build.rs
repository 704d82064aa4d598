use std::env::var;
use std::io::Result;

fn main() -> Result<()> {
    let proto_files = &["proto/bookstore.proto"];
    let proto_folder = "proto";

    let out_dir = var("OUT_DIR").expect("Missing OUT_DIR environment variable");
    let descriptors_path = format!("{}/bookstore_descriptor.bin", out_dir);

    tonic_prost_build::configure()
        .file_descriptor_set_path(descriptors_path)
        .build_server(true)
        .build_client(true)
        .compile_protos(proto_files, &[proto_folder])?;

    println!("cargo:rerun-if-changed=proto/bookstore.proto");

    Ok(())
}
