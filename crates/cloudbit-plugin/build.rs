fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Terraform plugin protocol and the go-plugin controller service
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(
            &["proto/tfplugin6.proto", "proto/grpc_controller.proto"],
            &["proto"],
        )?;

    println!("cargo:rerun-if-changed=proto/tfplugin6.proto");
    println!("cargo:rerun-if-changed=proto/grpc_controller.proto");

    Ok(())
}
